use {
    crate::egl::{
        proc::ExtProc,
        sys::{
            EGL_BAD_ACCESS, EGL_BAD_ALLOC, EGL_BAD_ATTRIBUTE, EGL_BAD_CONFIG, EGL_BAD_CONTEXT,
            EGL_BAD_CURRENT_SURFACE, EGL_BAD_DISPLAY, EGL_BAD_MATCH, EGL_BAD_NATIVE_PIXMAP,
            EGL_BAD_NATIVE_WINDOW, EGL_BAD_PARAMETER, EGL_BAD_SURFACE, EGL_CONTEXT_LOST,
            EGL_FALSE, EGL_NOT_INITIALIZED, EGL_SUCCESS, EGLDisplay, EGLImageKHR, EGLint,
            EglGetError, EglGetProcAddress,
        },
    },
    libloading::Library,
    std::{ptr, sync::LazyLock},
    thiserror::Error,
};

mod proc;
pub mod sys;

const LIBEGL: &str = "libEGL.so.1";

#[derive(Debug, Error)]
pub enum EglLoadError {
    #[error("Could not load {}", LIBEGL)]
    Open(#[source] libloading::Error),
    #[error("{} does not export `{}`", LIBEGL, .0)]
    MissingSymbol(&'static str, #[source] libloading::Error),
}

struct EglLib {
    _lib: Library,
    get_proc_address: EglGetProcAddress,
    get_error: EglGetError,
}

impl EglLib {
    fn open() -> Result<Self, EglLoadError> {
        unsafe {
            let lib = Library::new(LIBEGL).map_err(EglLoadError::Open)?;
            let get_proc_address = *lib
                .get::<EglGetProcAddress>(&b"eglGetProcAddress\0"[..])
                .map_err(|e| EglLoadError::MissingSymbol("eglGetProcAddress", e))?;
            let get_error = *lib
                .get::<EglGetError>(&b"eglGetError\0"[..])
                .map_err(|e| EglLoadError::MissingSymbol("eglGetError", e))?;
            Ok(Self {
                _lib: lib,
                get_proc_address,
                get_error,
            })
        }
    }
}

static LIB: LazyLock<Option<EglLib>> = LazyLock::new(|| match EglLib::open() {
    Ok(lib) => Some(lib),
    Err(e) => {
        log::error!("{}", crate::utils::errorfmt::ErrorFmt(e));
        None
    }
});

/// Extension entry points, resolved once on first use.
pub(crate) static PROCS: LazyLock<ExtProc> = LazyLock::new(|| {
    let procs = ExtProc::load(|name| match &*LIB {
        Some(lib) => unsafe { (lib.get_proc_address)(name.as_ptr()) },
        None => ptr::null_mut(),
    });
    if let Some(name) = procs.missing() {
        log::error!("EGL does not provide `{}`", name);
    }
    procs
});

/// Returns the error of the last EGL call on this thread.
///
/// Returns `None` if libEGL could not be loaded.
pub fn get_error() -> Option<EGLint> {
    (*LIB).as_ref().map(|lib| unsafe { (lib.get_error)() })
}

/// Destroys an image created by [`crate::import::EglCreateImage`].
///
/// # Safety
///
/// `dpy` must be the display the image was created on and `img` must not be
/// used afterwards.
pub unsafe fn destroy_image(dpy: EGLDisplay, img: EGLImageKHR) {
    if unsafe { PROCS.eglDestroyImageKHR(dpy, img) } == EGL_FALSE {
        log::warn!("`eglDestroyImageKHR` failed: {}", error_name(get_error().unwrap_or(0)));
    }
}

pub fn error_name(error: EGLint) -> &'static str {
    macro_rules! en {
        ($($name:ident,)*) => {
            match error {
                $($name => stringify!($name),)*
                _ => "unknown",
            }
        }
    }
    en! {
        EGL_SUCCESS,
        EGL_NOT_INITIALIZED,
        EGL_BAD_ACCESS,
        EGL_BAD_ALLOC,
        EGL_BAD_ATTRIBUTE,
        EGL_BAD_CONTEXT,
        EGL_BAD_CONFIG,
        EGL_BAD_CURRENT_SURFACE,
        EGL_BAD_DISPLAY,
        EGL_BAD_SURFACE,
        EGL_BAD_MATCH,
        EGL_BAD_PARAMETER,
        EGL_BAD_NATIVE_PIXMAP,
        EGL_BAD_NATIVE_WINDOW,
        EGL_CONTEXT_LOST,
    }
}
