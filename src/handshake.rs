use {
    crate::utils::oserror::OsError,
    uapi::c,
};


pub const HANDSHAKE_MAGIC: u32 = 0x42;
pub const RECORD_SIZE: usize = 8;

/// The record a producer writes to the side channel to announce the
/// `wl_surface` it renders into.
///
/// Both fields are in native byte order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HandshakeRecord {
    pub magic: u32,
    pub surface_id: u32,
}

impl HandshakeRecord {
    pub fn register(surface_id: u32) -> Self {
        Self {
            magic: HANDSHAKE_MAGIC,
            surface_id,
        }
    }

    pub fn parse(buf: &[u8; RECORD_SIZE]) -> Self {
        let [m0, m1, m2, m3, s0, s1, s2, s3] = *buf;
        Self {
            magic: u32::from_ne_bytes([m0, m1, m2, m3]),
            surface_id: u32::from_ne_bytes([s0, s1, s2, s3]),
        }
    }

    pub fn to_bytes(self) -> [u8; RECORD_SIZE] {
        let mut buf = [0; RECORD_SIZE];
        buf[..4].copy_from_slice(&self.magic.to_ne_bytes());
        buf[4..].copy_from_slice(&self.surface_id.to_ne_bytes());
        buf
    }

    /// Whether the session acts on this record. Other magics are reserved.
    pub fn is_registration(&self) -> bool {
        self.magic == HANDSHAKE_MAGIC
    }
}

/// Announces `surface_id` on the producer's end of the side channel.
pub fn announce_surface(fd: c::c_int, surface_id: u32) -> Result<(), OsError> {
    send_record(fd, HandshakeRecord::register(surface_id))
}

pub fn send_record(fd: c::c_int, record: HandshakeRecord) -> Result<(), OsError> {
    let buf = record.to_bytes();
    let n = uapi::write(fd, &buf[..])?;
    if n != RECORD_SIZE {
        return Err(OsError(c::EMSGSIZE));
    }
    Ok(())
}
