//! Chat partner list with live presence.

use collab_proto::models::{ChatPartner, UserId};
use collab_proto::presence::PresenceStatus;

/// The partners the session user can chat with.
#[derive(Debug, Default)]
pub struct Roster {
    partners: Vec<ChatPartner>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the list with a fresh load, dropping the session user.
    pub fn load(&mut self, partners: Vec<ChatPartner>, me: UserId) {
        self.partners = partners.into_iter().filter(|p| p.id != me).collect();
    }

    /// Updates one partner's presence. Returns `false` if they are unknown.
    pub fn set_presence(&mut self, id: UserId, status: PresenceStatus) -> bool {
        let Some(partner) = self.partners.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        partner.is_online = status.is_online();
        true
    }

    /// Presence of `id`, if known.
    #[must_use]
    pub fn presence(&self, id: UserId) -> Option<PresenceStatus> {
        self.get(id).map(|p| PresenceStatus::from(p.is_online))
    }

    /// Partner by id.
    #[must_use]
    pub fn get(&self, id: UserId) -> Option<&ChatPartner> {
        self.partners.iter().find(|p| p.id == id)
    }

    /// Partner at display position `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&ChatPartner> {
        self.partners.get(index)
    }

    /// Display position of `id`.
    #[must_use]
    pub fn position(&self, id: UserId) -> Option<usize> {
        self.partners.iter().position(|p| p.id == id)
    }

    /// All partners in display order.
    #[must_use]
    pub fn partners(&self) -> &[ChatPartner] {
        &self.partners
    }

    /// Number of partners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partners.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}
