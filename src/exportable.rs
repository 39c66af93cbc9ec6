use {
    crate::{
        buffer::ExportedBuffer,
        config::ExportConfig,
        dmabuf::DmaBuf,
        egl::sys::{EGLDisplay, EGLImageKHR},
        event_loop::EventLoopRef,
        ifs::{ExportClient, ExportableClient, ViewBackend},
        import::{CreateImage, EglCreateImage, ImportError, import_image},
        registry::SurfaceRegistry,
        session::{SessionError, ViewSession},
    },
    std::rc::Rc,
    uapi::OwnedFd,
};

#[cfg(test)]
mod tests;

/// Process-wide state shared by all exported views.
pub struct ExportContext {
    pub registry: Rc<SurfaceRegistry>,
    pub eng: EventLoopRef,
    pub config: ExportConfig,
}

impl ExportContext {
    pub fn new(eng: &EventLoopRef, config: ExportConfig) -> Rc<Self> {
        Rc::new(Self {
            registry: SurfaceRegistry::new(),
            eng: eng.clone(),
            config,
        })
    }
}

/// A view whose rendered buffers are handed to an [`ExportClient`].
pub struct ViewBackendExportable {
    backend: Rc<dyn ViewBackend>,
    session: Rc<ViewSession>,
}

impl ViewBackendExportable {
    /// Creates the view. The side channel is created by
    /// [`initialize`](Self::initialize).
    pub fn create(
        ctx: &ExportContext,
        backend: Rc<dyn ViewBackend>,
        client: Rc<dyn ExportClient>,
        width: u32,
        height: u32,
    ) -> Self {
        let session = ViewSession::new(
            &ctx.registry,
            &ctx.eng,
            ctx.config,
            backend.clone(),
            client,
            width,
            height,
        );
        log::debug!("Created exportable view {}", session.id());
        Self { backend, session }
    }

    pub fn initialize(&self) {
        self.session.open();
    }

    pub fn view_backend(&self) -> &Rc<dyn ViewBackend> {
        &self.backend
    }

    pub fn session(&self) -> &Rc<ViewSession> {
        &self.session
    }

    /// The object the Wayland layer forwards buffers and frame callbacks to.
    pub fn exportable_client(&self) -> Rc<dyn ExportableClient> {
        self.session.clone()
    }

    /// A new descriptor of the producer's end of the side channel.
    pub fn get_consumer_fd(&self) -> Result<OwnedFd, SessionError> {
        self.session.borrow_consumer_fd()
    }

    pub fn dispatch_frame_complete(&self) {
        self.session.dispatch_frame_complete();
    }

    pub fn dispatch_release_buffer(&self, buffer: ExportedBuffer) {
        self.session.release_buffer(buffer);
    }

    /// Imports `buffer` with `eglCreateImageKHR`.
    ///
    /// # Safety
    ///
    /// `display` must be an initialized EGL display.
    pub unsafe fn import_to_gpu_image(
        &self,
        buffer: &ExportedBuffer,
        display: EGLDisplay,
    ) -> Result<EGLImageKHR, ImportError> {
        unsafe { self.import_to_gpu_image_with(&EglCreateImage, buffer, display) }
    }

    /// # Safety
    ///
    /// `display` must be valid for `create`.
    pub unsafe fn import_to_gpu_image_with(
        &self,
        create: &dyn CreateImage,
        buffer: &ExportedBuffer,
        display: EGLDisplay,
    ) -> Result<EGLImageKHR, ImportError> {
        unsafe { import_image(create, buffer, display) }
    }

    pub fn query_dmabuf_descriptor<'a>(&self, buffer: &'a ExportedBuffer) -> Option<&'a DmaBuf> {
        buffer.dmabuf()
    }

    /// Releases the view even if the Wayland layer still holds its
    /// [`exportable_client`](Self::exportable_client).
    pub fn destroy(self) {
        log::debug!("Destroying exportable view {}", self.session.id());
        self.session.close();
    }
}
