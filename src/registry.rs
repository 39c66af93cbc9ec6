use {
    crate::{ifs::ExportableClient, utils::copyhashmap::CopyHashMap},
    std::rc::{Rc, Weak},
};


linear_ids!(SessionIds, SessionId);

#[derive(Clone)]
struct Registration {
    session: SessionId,
    client: Weak<dyn ExportableClient>,
}

/// Maps the surface ids announced over side channels to the views that
/// render into them.
///
/// The registry never keeps a view alive. Views remove their entries when
/// they are destroyed.
#[derive(Default)]
pub struct SurfaceRegistry {
    pub session_ids: SessionIds,
    surfaces: CopyHashMap<u32, Registration>,
}

impl SurfaceRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Associates `surface_id` with a view.
    ///
    /// An id that is already registered to another view is taken over by the
    /// new one.
    pub fn register(
        &self,
        surface_id: u32,
        session: SessionId,
        client: Weak<dyn ExportableClient>,
    ) {
        let prev = self
            .surfaces
            .set(surface_id, Registration { session, client });
        match prev {
            Some(prev) if prev.session == session => {}
            Some(prev) => log::debug!(
                "Surface {} moved from session {} to session {}",
                surface_id,
                prev.session,
                session,
            ),
            None => log::debug!("Surface {} registered to session {}", surface_id, session),
        }
    }

    /// Removes `surface_id` if it still belongs to `session`.
    pub fn unregister(&self, surface_id: u32, session: SessionId) -> bool {
        self.surfaces
            .remove_if(&surface_id, |r| r.session == session)
            .is_some()
    }

    pub fn lookup(&self, surface_id: u32) -> Option<Rc<dyn ExportableClient>> {
        let registration = self.surfaces.get(&surface_id)?;
        match registration.client.upgrade() {
            Some(client) => Some(client),
            None => {
                log::warn!(
                    "Surface {} refers to destroyed session {}",
                    surface_id,
                    registration.session,
                );
                self.unregister(surface_id, registration.session);
                None
            }
        }
    }

    pub fn owner(&self, surface_id: u32) -> Option<SessionId> {
        self.surfaces.get(&surface_id).map(|r| r.session)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
