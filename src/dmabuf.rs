use {
    arrayvec::ArrayVec,
    std::rc::Rc,
    thiserror::Error,
    uapi::OwnedFd,
};

pub type Modifier = u64;

/// `DRM_FORMAT_MOD_INVALID`: the buffer carries no explicit modifier.
pub const INVALID_MODIFIER: Modifier = 0x00ff_ffff_ffff_ffff;
pub const LINEAR_MODIFIER: Modifier = 0;

pub const MAX_PLANES: usize = 4;

pub type PlaneVec<T> = ArrayVec<T, MAX_PLANES>;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum DmaBufError {
    #[error("The buffer has no planes")]
    NoPlanes,
    #[error("The buffer has a size of {0}x{1}")]
    InvalidSize(i32, i32),
}

#[derive(Clone, Debug)]
pub struct DmaBufPlane {
    pub offset: u32,
    pub stride: u32,
    pub modifier: Modifier,
    pub fd: Rc<OwnedFd>,
}

/// A decoded linux-dmabuf descriptor.
///
/// The file descriptors are borrowed by importers. Anyone holding on to them
/// past the export callback has to duplicate them.
#[derive(Clone, Debug)]
pub struct DmaBuf {
    pub width: i32,
    pub height: i32,
    pub format: u32,
    pub planes: PlaneVec<DmaBufPlane>,
}

impl DmaBuf {
    pub fn validate(&self) -> Result<(), DmaBufError> {
        if self.planes.is_empty() {
            return Err(DmaBufError::NoPlanes);
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(DmaBufError::InvalidSize(self.width, self.height));
        }
        Ok(())
    }
}
