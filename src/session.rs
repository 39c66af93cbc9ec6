use {
    crate::{
        buffer::ExportedBuffer,
        config::ExportConfig,
        dmabuf::DmaBuf,
        event_loop::{EventLoopDispatcher, EventLoopError, EventLoopId, EventLoopRef},
        handshake::{HandshakeRecord, RECORD_SIZE},
        ifs::{ExportClient, ExportableClient, FrameCallback, SharedBuffer, ViewBackend},
        registry::{SessionId, SurfaceRegistry},
        utils::{errorfmt::ErrorFmt, nonblock::set_nonblock, oserror::OsError},
    },
    isnt::std_1::primitive::IsntSliceExt,
    smallvec::SmallVec,
    std::{
        cell::{Cell, RefCell},
        error::Error,
        mem,
        rc::{Rc, Weak},
    },
    thiserror::Error,
    uapi::{OwnedFd, c},
};


#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not create a socketpair")]
    Socketpair(#[source] OsError),
    #[error("Could not make the side channel non-blocking")]
    NonBlock(#[source] OsError),
    #[error("Could not watch the side channel")]
    Watch(#[source] EventLoopError),
    #[error("The session has no side channel")]
    NoChannel,
    #[error("Could not duplicate the consumer end of the side channel")]
    Dup(#[source] OsError),
}

struct Channel {
    socket: OwnedFd,
    consumer: OwnedFd,
    source: Cell<Option<EventLoopId>>,
}

/// The export state of one view.
///
/// The producer announces the surfaces it renders into over a side channel.
/// Once a surface is registered, the Wayland layer forwards its buffers and
/// frame callbacks here through [`ExportableClient`].
pub struct ViewSession {
    id: SessionId,
    slf: Weak<ViewSession>,
    registry: Rc<SurfaceRegistry>,
    eng: EventLoopRef,
    config: ExportConfig,
    backend: Rc<dyn ViewBackend>,
    client: Rc<dyn ExportClient>,
    initial_width: u32,
    initial_height: u32,
    opened: Cell<bool>,
    closed: Cell<bool>,
    channel: RefCell<Option<Channel>>,
    frame_callbacks: RefCell<Vec<Rc<dyn FrameCallback>>>,
    surfaces: RefCell<SmallVec<[u32; 1]>>,
}

impl ViewSession {
    pub fn new(
        registry: &Rc<SurfaceRegistry>,
        eng: &EventLoopRef,
        config: ExportConfig,
        backend: Rc<dyn ViewBackend>,
        client: Rc<dyn ExportClient>,
        width: u32,
        height: u32,
    ) -> Rc<Self> {
        Rc::new_cyclic(|slf| Self {
            id: registry.session_ids.next(),
            slf: slf.clone(),
            registry: registry.clone(),
            eng: eng.clone(),
            config,
            backend,
            client,
            initial_width: width,
            initial_height: height,
            opened: Cell::new(false),
            closed: Cell::new(false),
            channel: Default::default(),
            frame_callbacks: Default::default(),
            surfaces: Default::default(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Creates the side channel and requests the initial size.
    ///
    /// If the channel cannot be created, the session keeps working but can
    /// never be registered.
    pub fn open(&self) {
        if self.opened.replace(true) || self.closed.get() {
            return;
        }
        match self.open_channel() {
            Ok(channel) => *self.channel.borrow_mut() = Some(channel),
            Err(e) => log::warn!(
                "Session {} has no side channel and cannot be registered: {}",
                self.id,
                ErrorFmt(e),
            ),
        }
        self.backend
            .dispatch_set_size(self.initial_width, self.initial_height);
    }

    fn open_channel(&self) -> Result<Channel, SessionError> {
        let (socket, consumer) =
            uapi::socketpair(c::AF_UNIX, c::SOCK_SEQPACKET | c::SOCK_CLOEXEC, 0)
                .map_err(|e| SessionError::Socketpair(e.into()))?;
        set_nonblock(socket.raw()).map_err(SessionError::NonBlock)?;
        let id = self.eng.id().map_err(SessionError::Watch)?;
        let reader = Rc::new(ChannelReader {
            session: self.slf.clone(),
        });
        self.eng
            .insert(
                id,
                Some(socket.raw()),
                c::EPOLLIN,
                self.config.channel_priority,
                reader,
            )
            .map_err(SessionError::Watch)?;
        log::debug!("Session {} opened its side channel", self.id);
        Ok(Channel {
            socket,
            consumer,
            source: Cell::new(Some(id)),
        })
    }

    pub fn has_channel(&self) -> bool {
        self.channel.borrow().is_some()
    }

    /// Whether records arriving on the side channel are still processed.
    pub fn is_watching(&self) -> bool {
        match &*self.channel.borrow() {
            Some(channel) => channel.source.get().is_some(),
            None => false,
        }
    }

    /// Returns a new descriptor of the consumer end. The caller owns it.
    pub fn borrow_consumer_fd(&self) -> Result<OwnedFd, SessionError> {
        let channel = self.channel.borrow();
        let Some(channel) = &*channel else {
            return Err(SessionError::NoChannel);
        };
        uapi::fcntl_dupfd_cloexec(channel.consumer.raw(), 0)
            .map_err(|e| SessionError::Dup(e.into()))
    }

    fn handle_readable(&self) {
        let fd = match &*self.channel.borrow() {
            Some(channel) if channel.source.get().is_some() => channel.socket.raw(),
            _ => return,
        };
        let mut buf = [0u8; RECORD_SIZE];
        let len = match uapi::read(fd, &mut buf[..]) {
            Ok(read) => read.len(),
            Err(e) => {
                let e = OsError::from(e);
                if e.is_transient() {
                    return;
                }
                log::warn!(
                    "Session {}: could not read from the side channel: {}",
                    self.id,
                    ErrorFmt(e),
                );
                self.stop_watching();
                return;
            }
        };
        if len < RECORD_SIZE {
            log::debug!(
                "Session {}: side channel yielded {} bytes, treating the peer as gone",
                self.id,
                len,
            );
            self.stop_watching();
            return;
        }
        let record = HandshakeRecord::parse(&buf);
        if !record.is_registration() {
            log::trace!(
                "Session {}: ignoring record with magic {:#x}",
                self.id,
                record.magic,
            );
            return;
        }
        self.register_surface(record.surface_id);
    }

    fn stop_watching(&self) {
        let source = match &*self.channel.borrow() {
            Some(channel) => channel.source.take(),
            None => None,
        };
        if let Some(source) = source {
            if let Err(e) = self.eng.remove(source) {
                log::debug!(
                    "Session {}: could not remove the side channel source: {}",
                    self.id,
                    ErrorFmt(e),
                );
            }
        }
    }

    fn register_surface(&self, surface_id: u32) {
        let client: Weak<dyn ExportableClient> = self.slf.clone();
        self.registry.register(surface_id, self.id, client);
        let mut surfaces = self.surfaces.borrow_mut();
        if !surfaces.contains(&surface_id) {
            surfaces.push(surface_id);
        }
    }

    /// The surface ids this session has registered, in announcement order.
    pub fn surfaces(&self) -> SmallVec<[u32; 1]> {
        self.surfaces.borrow().clone()
    }

    pub fn queue_frame_callback(&self, callback: Rc<dyn FrameCallback>) {
        if self.closed.get() {
            return;
        }
        self.frame_callbacks.borrow_mut().push(callback);
    }

    pub fn pending_frame_callbacks(&self) -> usize {
        self.frame_callbacks.borrow().len()
    }

    /// Signals every queued frame callback in queue order.
    ///
    /// Callbacks queued while this runs are kept for the next call.
    pub fn dispatch_frame_complete(&self) {
        let callbacks = mem::take(&mut *self.frame_callbacks.borrow_mut());
        for callback in callbacks {
            callback.send_done(0);
        }
    }

    pub fn export_buffer(&self, buffer: ExportedBuffer) {
        if self.surfaces.borrow().is_empty() {
            log::debug!(
                "Session {} exports a buffer without a registered surface",
                self.id,
            );
        }
        let kind = buffer.kind();
        self.client.export_buffer(kind, buffer);
    }

    /// Gives a buffer back to the producer.
    ///
    /// Only `wl_buffer`s are released explicitly. The descriptors of a dmabuf
    /// were only lent to the client.
    pub fn release_buffer(&self, buffer: ExportedBuffer) {
        match buffer {
            ExportedBuffer::Shared(shared) => shared.send_release(),
            ExportedBuffer::DmaBuf(_) => {}
        }
    }

    /// Releases the side channel, the registrations and the pending frame
    /// callbacks.
    ///
    /// Strong references held elsewhere keep the object alive but it no longer
    /// resolves any surface and ignores the side channel.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.stop_watching();
        self.channel.take();
        let surfaces = mem::take(&mut *self.surfaces.borrow_mut());
        for surface_id in surfaces {
            self.registry.unregister(surface_id, self.id);
        }
        let pending = mem::take(&mut *self.frame_callbacks.borrow_mut());
        if pending.is_not_empty() {
            log::debug!(
                "Session {} discards {} pending frame callbacks",
                self.id,
                pending.len(),
            );
        }
    }
}

impl ExportableClient for ViewSession {
    fn frame_callback(&self, callback: Rc<dyn FrameCallback>) {
        self.queue_frame_callback(callback);
    }

    fn export_buffer_resource(&self, buffer: Rc<dyn SharedBuffer>) {
        self.export_buffer(ExportedBuffer::Shared(buffer));
    }

    fn export_linux_dmabuf(&self, dmabuf: Rc<DmaBuf>) {
        self.export_buffer(ExportedBuffer::DmaBuf(dmabuf));
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        self.close();
    }
}

struct ChannelReader {
    session: Weak<ViewSession>,
}

impl EventLoopDispatcher for ChannelReader {
    fn dispatch(&self, _events: i32) -> Result<(), Box<dyn Error>> {
        if let Some(session) = self.session.upgrade() {
            session.handle_readable();
        }
        Ok(())
    }
}
