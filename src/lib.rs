#![allow(clippy::len_zero, clippy::new_without_default)]

#[macro_use]
mod macros;

pub mod buffer;
pub mod config;
pub mod dmabuf;
pub mod egl;
pub mod event_loop;
pub mod exportable;
pub mod handshake;
pub mod ifs;
pub mod import;
pub mod registry;
pub mod session;
#[cfg(test)]
mod test_utils;
pub mod utils;

pub use {
    buffer::{BufferKind, ExportedBuffer},
    config::ExportConfig,
    dmabuf::{DmaBuf, DmaBufPlane},
    exportable::{ExportContext, ViewBackendExportable},
    import::{CreateImage, EglCreateImage, ImportError},
    registry::SurfaceRegistry,
};
