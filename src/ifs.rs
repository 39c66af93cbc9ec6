//! Interfaces of the collaborators around an exported view.
//!
//! The Wayland server, the view backend and the consumer of the buffers live
//! outside of this crate and are reached through these traits.

use {
    crate::{
        buffer::{BufferKind, ExportedBuffer},
        dmabuf::DmaBuf,
        egl::sys::EGLClientBuffer,
    },
    std::rc::Rc,
};

/// A `wl_buffer` resource attached by the producer.
pub trait SharedBuffer {
    /// The resource pointer passed to `eglCreateImageKHR`. Never null.
    fn client_buffer(&self) -> EGLClientBuffer;

    /// Sends `wl_buffer.release` so the producer can reuse the buffer.
    fn send_release(&self);
}

/// A pending `wl_callback` from `wl_surface.frame`.
pub trait FrameCallback {
    fn send_done(&self, time: u32);
}

/// The view backend of the producer.
pub trait ViewBackend {
    fn dispatch_set_size(&self, width: u32, height: u32);
}

/// The consumer of exported buffers.
pub trait ExportClient {
    fn export_buffer(&self, kind: BufferKind, buffer: ExportedBuffer);
}

/// What the Wayland layer sees of a registered view.
pub trait ExportableClient {
    fn frame_callback(&self, callback: Rc<dyn FrameCallback>);
    fn export_buffer_resource(&self, buffer: Rc<dyn SharedBuffer>);
    fn export_linux_dmabuf(&self, dmabuf: Rc<DmaBuf>);
}
