use {
    crate::utils::{copyhashmap::CopyHashMap, numcell::NumCell, oserror::OsError},
    serde::Deserialize,
    std::{
        cell::{Cell, RefCell},
        error::Error,
        rc::{Rc, Weak},
    },
    thiserror::Error,
    uapi::{Errno, OwnedFd, c},
};


#[derive(Debug, Error)]
pub enum EventLoopError {
    #[error("Could not create an epoll fd")]
    CreateFailed(#[source] OsError),
    #[error("epoll_wait failed")]
    WaitFailed(#[source] OsError),
    #[error("A dispatcher returned a fatal error")]
    DispatcherError(#[source] Box<dyn Error>),
    #[error("Could not insert an fd to wait on")]
    InsertFailed(#[source] OsError),
    #[error("Could not remove an fd to wait on")]
    RemoveFailed(#[source] OsError),
    #[error("Entry is not registered")]
    NoEntry,
    #[error("Event loop is already destroyed")]
    Destroyed,
}

#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct EventLoopId(u64);

/// Dispatch order of sources that become ready in the same wakeup.
///
/// Smaller values are dispatched first.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const HIGH: Self = Self(-100);
    pub const DEFAULT: Self = Self(0);
    pub const LOW: Self = Self(100);
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub trait EventLoopDispatcher {
    fn dispatch(&self, events: i32) -> Result<(), Box<dyn Error>>;
}

#[derive(Clone)]
struct Entry {
    fd: Option<i32>,
    priority: Priority,
    dispatcher: Rc<dyn EventLoopDispatcher>,
}

struct EventLoopData {
    epoll: OwnedFd,
    run: Cell<bool>,
    next_id: NumCell<u64>,
    entries: CopyHashMap<u64, Entry>,
    ready: RefCell<Vec<(Priority, u64, i32)>>,
}

pub struct EventLoop {
    data: Rc<EventLoopData>,
}

#[derive(Clone)]
pub struct EventLoopRef {
    data: Weak<EventLoopData>,
}

impl EventLoopData {
    fn new() -> Result<Self, EventLoopError> {
        let epoll = match uapi::epoll_create1(c::EPOLL_CLOEXEC) {
            Ok(e) => e,
            Err(e) => return Err(EventLoopError::CreateFailed(e.into())),
        };
        Ok(Self {
            epoll,
            run: Cell::new(true),
            next_id: NumCell::new(1),
            entries: CopyHashMap::new(),
            ready: Default::default(),
        })
    }

    fn id(&self) -> EventLoopId {
        EventLoopId(self.next_id.fetch_add(1))
    }

    fn stop(&self) {
        self.run.set(false);
    }

    fn insert(
        &self,
        id: EventLoopId,
        fd: Option<i32>,
        events: i32,
        priority: Priority,
        dispatcher: Rc<dyn EventLoopDispatcher>,
    ) -> Result<(), EventLoopError> {
        let id = id.0;
        if let Some(fd) = fd {
            let event = c::epoll_event {
                events: events as _,
                u64: id,
            };
            if let Err(e) = uapi::epoll_ctl(self.epoll.raw(), c::EPOLL_CTL_ADD, fd, Some(&event)) {
                return Err(EventLoopError::InsertFailed(e.into()));
            }
        }
        self.entries.set(
            id,
            Entry {
                fd,
                priority,
                dispatcher,
            },
        );
        Ok(())
    }

    fn remove(&self, id: EventLoopId) -> Result<(), EventLoopError> {
        let id = id.0;
        let entry = match self.entries.remove(&id) {
            Some(e) => e,
            None => return Err(EventLoopError::NoEntry),
        };
        if let Some(fd) = entry.fd {
            if let Err(e) = uapi::epoll_ctl(self.epoll.raw(), c::EPOLL_CTL_DEL, fd, None) {
                return Err(EventLoopError::RemoveFailed(e.into()));
            }
        }
        Ok(())
    }

    fn dispatch(&self, timeout: c::c_int) -> Result<usize, EventLoopError> {
        let mut buf = [c::epoll_event { events: 0, u64: 0 }; 16];
        let num = match uapi::epoll_wait(self.epoll.raw(), &mut buf, timeout) {
            Ok(n) => n,
            Err(Errno(c::EINTR)) => return Ok(0),
            Err(e) => return Err(EventLoopError::WaitFailed(e.into())),
        };
        // A dispatcher may call back into this function, so the batch is
        // moved out of the shared buffer before anything is dispatched.
        let mut ready = std::mem::take(&mut *self.ready.borrow_mut());
        ready.clear();
        for event in &buf[..num] {
            let id = event.u64;
            match self.entries.get(&id) {
                Some(entry) => ready.push((entry.priority, id, event.events as i32)),
                None => log::warn!("Source {} created an event but has already been removed", id),
            }
        }
        ready.sort_by_key(|&(priority, _, _)| priority);
        let mut dispatched = 0;
        let mut res = Ok(());
        for &(_, id, events) in &ready {
            if !self.run.get() {
                break;
            }
            // Earlier dispatchers in this batch may have removed the entry.
            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            dispatched += 1;
            if let Err(e) = entry.dispatcher.dispatch(events) {
                res = Err(EventLoopError::DispatcherError(e));
                break;
            }
        }
        *self.ready.borrow_mut() = ready;
        res.map(|_| dispatched)
    }

    fn run(&self) -> Result<(), EventLoopError> {
        while self.run.get() {
            self.dispatch(-1)?;
        }
        Ok(())
    }
}

impl EventLoop {
    pub fn new() -> Result<Self, EventLoopError> {
        Ok(Self {
            data: Rc::new(EventLoopData::new()?),
        })
    }

    pub fn to_ref(&self) -> EventLoopRef {
        EventLoopRef {
            data: Rc::downgrade(&self.data),
        }
    }

    pub fn run(&self) -> Result<(), EventLoopError> {
        self.data.run()
    }

    /// Waits at most `timeout` milliseconds for events and dispatches them.
    ///
    /// Returns the number of dispatched sources.
    pub fn dispatch(&self, timeout: c::c_int) -> Result<usize, EventLoopError> {
        self.data.dispatch(timeout)
    }

    pub fn len(&self) -> usize {
        self.data.entries.len()
    }
}

impl EventLoopRef {
    pub fn id(&self) -> Result<EventLoopId, EventLoopError> {
        match self.data.upgrade() {
            Some(d) => Ok(d.id()),
            None => Err(EventLoopError::Destroyed),
        }
    }

    pub fn stop(&self) {
        if let Some(d) = self.data.upgrade() {
            d.stop();
        }
    }

    pub fn insert(
        &self,
        id: EventLoopId,
        fd: Option<i32>,
        events: i32,
        priority: Priority,
        dispatcher: Rc<dyn EventLoopDispatcher>,
    ) -> Result<(), EventLoopError> {
        match self.data.upgrade() {
            Some(d) => d.insert(id, fd, events, priority, dispatcher),
            None => Err(EventLoopError::Destroyed),
        }
    }

    pub fn remove(&self, id: EventLoopId) -> Result<(), EventLoopError> {
        match self.data.upgrade() {
            Some(d) => d.remove(id),
            None => Err(EventLoopError::Destroyed),
        }
    }
}
