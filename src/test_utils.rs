use {
    crate::{
        buffer::{BufferKind, ExportedBuffer},
        dmabuf::{DmaBuf, DmaBufPlane, PlaneVec},
        egl::sys::{EGLClientBuffer, EGLDisplay, EGLImageKHR},
        ifs::{ExportClient, FrameCallback, SharedBuffer, ViewBackend},
        import::{CreateImage, ImageImport},
        utils::numcell::NumCell,
    },
    std::{
        cell::{Cell, RefCell},
        rc::Rc,
    },
    uapi::c,
};

pub struct TestSharedBuffer {
    pub resource: Box<u8>,
    pub releases: NumCell<u32>,
}

impl TestSharedBuffer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            resource: Box::new(0),
            releases: NumCell::new(0),
        })
    }
}

impl SharedBuffer for TestSharedBuffer {
    fn client_buffer(&self) -> EGLClientBuffer {
        EGLClientBuffer(&*self.resource as *const u8 as *mut u8)
    }

    fn send_release(&self) {
        self.releases.fetch_add(1);
    }
}

pub struct TestFrameCallback {
    pub token: u32,
    pub done: Rc<RefCell<Vec<u32>>>,
}

impl FrameCallback for TestFrameCallback {
    fn send_done(&self, _time: u32) {
        self.done.borrow_mut().push(self.token);
    }
}

#[derive(Default)]
pub struct TestViewBackend {
    pub sizes: RefCell<Vec<(u32, u32)>>,
}

impl ViewBackend for TestViewBackend {
    fn dispatch_set_size(&self, width: u32, height: u32) {
        self.sizes.borrow_mut().push((width, height));
    }
}

/// Keeps every exported buffer until the test takes it.
#[derive(Default)]
pub struct TestExportClient {
    pub exported: RefCell<Vec<(BufferKind, ExportedBuffer)>>,
    pub on_export: RefCell<Option<Box<dyn Fn(ExportedBuffer) -> Option<ExportedBuffer>>>>,
}

impl TestExportClient {
    pub fn take(&self) -> Vec<(BufferKind, ExportedBuffer)> {
        self.exported.take()
    }
}

impl ExportClient for TestExportClient {
    fn export_buffer(&self, kind: BufferKind, buffer: ExportedBuffer) {
        let hook = self.on_export.borrow_mut().take();
        let buffer = match &hook {
            Some(hook) => hook(buffer),
            None => Some(buffer),
        };
        if hook.is_some() {
            *self.on_export.borrow_mut() = hook;
        }
        if let Some(buffer) = buffer {
            self.exported.borrow_mut().push((kind, buffer));
        }
    }
}

/// Records the last import and hands out a fixed image.
pub struct TestCreateImage {
    pub image: Box<u8>,
    pub fail: Cell<bool>,
    pub last: RefCell<Option<ImageImport>>,
}

impl TestCreateImage {
    pub fn new() -> Self {
        Self {
            image: Box::new(0),
            fail: Cell::new(false),
            last: Default::default(),
        }
    }
}

impl CreateImage for TestCreateImage {
    unsafe fn create_image(&self, _dpy: EGLDisplay, import: &ImageImport) -> EGLImageKHR {
        *self.last.borrow_mut() = Some(ImageImport {
            target: import.target,
            client_buffer: import.client_buffer,
            attribs: import.attribs.clone(),
        });
        if self.fail.get() {
            return EGLImageKHR::none();
        }
        EGLImageKHR(&*self.image as *const u8 as *mut u8)
    }
}

pub fn test_display() -> EGLDisplay {
    EGLDisplay(0x1000 as *mut u8)
}

pub fn dmabuf(format: u32, modifiers: &[u64]) -> DmaBuf {
    let mut planes = PlaneVec::new();
    for (i, &modifier) in modifiers.iter().enumerate() {
        let fd = uapi::memfd_create("plane", c::MFD_CLOEXEC).unwrap();
        planes.push(DmaBufPlane {
            offset: 4096 * i as u32,
            stride: 3200 + i as u32,
            modifier,
            fd: Rc::new(fd),
        });
    }
    DmaBuf {
        width: 800,
        height: 600,
        format,
        planes,
    }
}
