//! Actor directory - resolves a user id to its role-bearing identity

use corebank_core::UserId;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::actor::{Actor, Role};

/// In-memory registry of role profiles.
///
/// A user may carry more than one profile; resolution walks the roles in
/// fixed priority order (Person, Manager, Accountant) and the first match
/// wins.
pub struct ActorDirectory {
    profiles: RwLock<HashMap<UserId, Vec<Actor>>>,
}

impl ActorDirectory {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Register a role profile for a user
    pub fn register(&self, actor: Actor) {
        self.profiles
            .write()
            .expect("directory lock poisoned")
            .entry(actor.user_id.clone())
            .or_default()
            .push(actor);
    }

    /// Resolve the acting identity for a user, highest-priority role first
    pub fn resolve(&self, user_id: &UserId) -> Option<Actor> {
        let profiles = self.profiles.read().expect("directory lock poisoned");
        let user_profiles = profiles.get(user_id)?;

        Role::PRIORITY
            .iter()
            .find_map(|role| user_profiles.iter().find(|p| p.role == *role))
            .cloned()
    }

    /// Resolve only if the user is a person or a manager (the roles that
    /// may hold a PIN and authorize transfers)
    pub fn resolve_person_or_manager(&self, user_id: &UserId) -> Option<Actor> {
        self.resolve(user_id)
            .filter(|actor| matches!(actor.role, Role::Person | Role::Manager))
    }
}

impl Default for ActorDirectory {
    fn default() -> Self {
        Self::new()
    }
}
