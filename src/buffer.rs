use {
    crate::{dmabuf::DmaBuf, ifs::SharedBuffer},
    std::{
        fmt::{Debug, Formatter},
        rc::Rc,
    },
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BufferKind {
    None,
    WlResource,
    LinuxDmabuf,
}

/// A buffer handed to the export client.
///
/// The client owns the value between the export callback and the release,
/// and gives it back by passing it to the release operation.
pub enum ExportedBuffer {
    Shared(Rc<dyn SharedBuffer>),
    DmaBuf(Rc<DmaBuf>),
}

impl ExportedBuffer {
    pub fn kind(&self) -> BufferKind {
        match self {
            ExportedBuffer::Shared(_) => BufferKind::WlResource,
            ExportedBuffer::DmaBuf(_) => BufferKind::LinuxDmabuf,
        }
    }

    pub fn dmabuf(&self) -> Option<&DmaBuf> {
        match self {
            ExportedBuffer::DmaBuf(d) => Some(d),
            ExportedBuffer::Shared(_) => None,
        }
    }

    pub fn shared(&self) -> Option<&Rc<dyn SharedBuffer>> {
        match self {
            ExportedBuffer::Shared(s) => Some(s),
            ExportedBuffer::DmaBuf(_) => None,
        }
    }
}

impl Debug for ExportedBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportedBuffer::Shared(s) => f
                .debug_tuple("Shared")
                .field(&s.client_buffer())
                .finish(),
            ExportedBuffer::DmaBuf(d) => f.debug_tuple("DmaBuf").field(d).finish(),
        }
    }
}
