//! User roster and presence tracking.
//!
//! The roster is fixed at startup from configuration. Presence is derived
//! from open chat connections: a user is online while at least one of their
//! sockets is open.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use collab_proto::models::{ChatPartner, UserId};

/// Known users and their live connection counts.
pub struct UserDirectory {
    users: BTreeMap<UserId, String>,
    connections: RwLock<HashMap<UserId, usize>>,
}

impl UserDirectory {
    /// Creates a directory from `(id, username)` pairs.
    pub fn new(users: impl IntoIterator<Item = (UserId, String)>) -> Self {
        Self {
            users: users.into_iter().collect(),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the username for `id`, if the user exists.
    #[must_use]
    pub fn username(&self, id: UserId) -> Option<&str> {
        self.users.get(&id).map(String::as_str)
    }

    /// Returns whether `id` names a known user.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// Records a new connection for `id`. Returns `true` if the user was
    /// offline before.
    pub async fn connect(&self, id: UserId) -> bool {
        let mut conns = self.connections.write().await;
        let count = conns.entry(id).or_default();
        *count += 1;
        *count == 1
    }

    /// Records a closed connection for `id`. Returns `true` if that was the
    /// user's last open connection.
    pub async fn disconnect(&self, id: UserId) -> bool {
        let mut conns = self.connections.write().await;
        match conns.get_mut(&id) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                conns.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Returns whether `id` has an open connection.
    pub async fn is_online(&self, id: UserId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Lists every user with current presence, ordered by id.
    pub async fn partners(&self) -> Vec<ChatPartner> {
        let conns = self.connections.read().await;
        self.users
            .iter()
            .map(|(id, username)| ChatPartner {
                id: *id,
                username: username.clone(),
                is_online: conns.contains_key(id),
            })
            .collect()
    }
}
