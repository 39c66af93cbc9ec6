use {
    crate::{
        buffer::ExportedBuffer,
        dmabuf::{DmaBuf, DmaBufError, MAX_PLANES},
        egl::{
            PROCS,
            sys::{
                EGL_DMA_BUF_PLANE0_FD_EXT, EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT,
                EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT, EGL_DMA_BUF_PLANE0_OFFSET_EXT,
                EGL_DMA_BUF_PLANE0_PITCH_EXT, EGL_DMA_BUF_PLANE1_FD_EXT,
                EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT,
                EGL_DMA_BUF_PLANE1_OFFSET_EXT, EGL_DMA_BUF_PLANE1_PITCH_EXT,
                EGL_DMA_BUF_PLANE2_FD_EXT, EGL_DMA_BUF_PLANE2_MODIFIER_HI_EXT,
                EGL_DMA_BUF_PLANE2_MODIFIER_LO_EXT, EGL_DMA_BUF_PLANE2_OFFSET_EXT,
                EGL_DMA_BUF_PLANE2_PITCH_EXT, EGL_DMA_BUF_PLANE3_FD_EXT,
                EGL_DMA_BUF_PLANE3_MODIFIER_HI_EXT, EGL_DMA_BUF_PLANE3_MODIFIER_LO_EXT,
                EGL_DMA_BUF_PLANE3_OFFSET_EXT, EGL_DMA_BUF_PLANE3_PITCH_EXT, EGL_HEIGHT,
                EGL_LINUX_DMA_BUF_EXT, EGL_LINUX_DRM_FOURCC_EXT, EGL_NONE, EGL_WAYLAND_BUFFER_WL,
                EGL_WAYLAND_PLANE_WL, EGL_WIDTH, EGLClientBuffer, EGLContext, EGLDisplay,
                EGLImageKHR, EGLenum, EGLint,
            },
        },
    },
    arrayvec::ArrayVec,
    thiserror::Error,
};


/// Fixed dmabuf keys, per-plane keys for every plane and the terminator,
/// rounded up to an even number of slots.
pub const MAX_ATTRIBS: usize = 48;

const _: () = assert!(2 * (3 + 5 * MAX_PLANES) + 1 <= MAX_ATTRIBS);

pub type AttribVec = ArrayVec<EGLint, MAX_ATTRIBS>;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ImportError {
    #[error("The dmabuf cannot be imported")]
    InvalidDmaBuf(#[from] DmaBufError),
    #[error("`eglCreateImageKHR` failed")]
    CreateImage,
}

struct PlaneKey {
    fd: EGLint,
    offset: EGLint,
    pitch: EGLint,
    mod_lo: EGLint,
    mod_hi: EGLint,
}

const PLANE_KEYS: [PlaneKey; MAX_PLANES] = [
    PlaneKey {
        fd: EGL_DMA_BUF_PLANE0_FD_EXT,
        offset: EGL_DMA_BUF_PLANE0_OFFSET_EXT,
        pitch: EGL_DMA_BUF_PLANE0_PITCH_EXT,
        mod_lo: EGL_DMA_BUF_PLANE0_MODIFIER_LO_EXT,
        mod_hi: EGL_DMA_BUF_PLANE0_MODIFIER_HI_EXT,
    },
    PlaneKey {
        fd: EGL_DMA_BUF_PLANE1_FD_EXT,
        offset: EGL_DMA_BUF_PLANE1_OFFSET_EXT,
        pitch: EGL_DMA_BUF_PLANE1_PITCH_EXT,
        mod_lo: EGL_DMA_BUF_PLANE1_MODIFIER_LO_EXT,
        mod_hi: EGL_DMA_BUF_PLANE1_MODIFIER_HI_EXT,
    },
    PlaneKey {
        fd: EGL_DMA_BUF_PLANE2_FD_EXT,
        offset: EGL_DMA_BUF_PLANE2_OFFSET_EXT,
        pitch: EGL_DMA_BUF_PLANE2_PITCH_EXT,
        mod_lo: EGL_DMA_BUF_PLANE2_MODIFIER_LO_EXT,
        mod_hi: EGL_DMA_BUF_PLANE2_MODIFIER_HI_EXT,
    },
    PlaneKey {
        fd: EGL_DMA_BUF_PLANE3_FD_EXT,
        offset: EGL_DMA_BUF_PLANE3_OFFSET_EXT,
        pitch: EGL_DMA_BUF_PLANE3_PITCH_EXT,
        mod_lo: EGL_DMA_BUF_PLANE3_MODIFIER_LO_EXT,
        mod_hi: EGL_DMA_BUF_PLANE3_MODIFIER_HI_EXT,
    },
];

/// The arguments of one `eglCreateImageKHR` call.
#[derive(Debug)]
pub struct ImageImport {
    pub target: EGLenum,
    pub client_buffer: EGLClientBuffer,
    /// Key/value pairs terminated by `EGL_NONE`.
    pub attribs: AttribVec,
}

impl ImageImport {
    pub fn new(buffer: &ExportedBuffer) -> Result<Self, ImportError> {
        match buffer {
            ExportedBuffer::Shared(shared) => {
                let mut attribs = AttribVec::new();
                attribs.extend([EGL_WAYLAND_PLANE_WL, 0]);
                attribs.push(EGL_NONE);
                Ok(Self {
                    target: EGL_WAYLAND_BUFFER_WL as _,
                    client_buffer: shared.client_buffer(),
                    attribs,
                })
            }
            ExportedBuffer::DmaBuf(buf) => Self::dmabuf(buf),
        }
    }

    fn dmabuf(buf: &DmaBuf) -> Result<Self, ImportError> {
        buf.validate()?;
        let mut attribs = AttribVec::new();
        attribs.extend([EGL_WIDTH, buf.width]);
        attribs.extend([EGL_HEIGHT, buf.height]);
        attribs.extend([EGL_LINUX_DRM_FOURCC_EXT, buf.format as _]);
        for (key, plane) in PLANE_KEYS.iter().zip(buf.planes.iter()) {
            attribs.extend([key.fd, plane.fd.raw()]);
            attribs.extend([key.offset, plane.offset as _]);
            attribs.extend([key.pitch, plane.stride as _]);
            attribs.extend([key.mod_lo, plane.modifier as u32 as _]);
            attribs.extend([key.mod_hi, (plane.modifier >> 32) as u32 as _]);
        }
        attribs.push(EGL_NONE);
        Ok(Self {
            target: EGL_LINUX_DMA_BUF_EXT as _,
            client_buffer: EGLClientBuffer::none(),
            attribs,
        })
    }

    pub fn pairs(&self) -> impl Iterator<Item = (EGLint, EGLint)> + '_ {
        self.attribs.chunks_exact(2).map(|kv| (kv[0], kv[1]))
    }

    /// The number of key/value pairs plus the terminator.
    pub fn entries(&self) -> usize {
        self.attribs.len() / 2 + 1
    }
}

/// The entry point that turns an [`ImageImport`] into an image.
pub trait CreateImage {
    /// # Safety
    ///
    /// `dpy` must be an initialized display and `import.attribs` must be
    /// terminated by `EGL_NONE`.
    unsafe fn create_image(&self, dpy: EGLDisplay, import: &ImageImport) -> EGLImageKHR;
}

/// `eglCreateImageKHR`, resolved through `eglGetProcAddress` on first use.
///
/// Panics if the entry point is not available.
#[derive(Copy, Clone, Debug, Default)]
pub struct EglCreateImage;

impl CreateImage for EglCreateImage {
    unsafe fn create_image(&self, dpy: EGLDisplay, import: &ImageImport) -> EGLImageKHR {
        unsafe {
            PROCS.eglCreateImageKHR(
                dpy,
                EGLContext::none(),
                import.target,
                import.client_buffer,
                import.attribs.as_ptr(),
            )
        }
    }
}

/// Imports `buffer` into an `EGLImageKHR`.
///
/// On `ImportError::CreateImage` the reason is available from
/// [`crate::egl::get_error`]. The image must be destroyed with
/// [`crate::egl::destroy_image`].
///
/// # Safety
///
/// `dpy` must be an initialized display supporting the import extension of
/// the buffer's kind.
pub unsafe fn import_image(
    create: &dyn CreateImage,
    buffer: &ExportedBuffer,
    dpy: EGLDisplay,
) -> Result<EGLImageKHR, ImportError> {
    let import = ImageImport::new(buffer)?;
    let img = unsafe { create.create_image(dpy, &import) };
    if img.is_none() {
        return Err(ImportError::CreateImage);
    }
    Ok(img)
}
