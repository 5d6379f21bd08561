pub mod ids;

pub use ids::*;

use crate::models::User;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard};

struct Inner {
    users: HashMap<i64, User>,
    ids: Box<dyn IdGenerator>,
}

/// Sole owner of the user collection. Every operation runs under one lock,
/// so at most one mutation is in flight and reads never observe a torn record.
pub struct UserStore {
    inner: Mutex<Inner>,
}

impl UserStore {
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                users: HashMap::new(),
                ids,
            }),
        }
    }

    // Each operation leaves the map consistent before it can panic, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocates an unused id and inserts an empty record under it.
    /// Loops until the generator yields a free id, whatever the size of its range.
    pub fn create(&self) -> i64 {
        let mut inner = self.lock();

        let mut id = inner.ids.next_id();
        while inner.users.contains_key(&id) {
            log::debug!("🔁 Id {} already taken, drawing again", id);
            id = inner.ids.next_id();
        }

        inner.users.insert(id, User::new(id));
        log::info!("👤 User {} created", id);
        id
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    /// Returns false if nothing was stored under `id`.
    pub fn delete(&self, id: i64) -> bool {
        let removed = self.lock().users.remove(&id).is_some();
        if removed {
            log::info!("🗑️  User {} deleted", id);
        }
        removed
    }

    /// Merge-update: an empty `name` or `email` keeps the current value.
    /// Returns false if `id` is not stored.
    pub fn update(&self, id: i64, name: &str, email: &str) -> bool {
        self.update_with(id, || Ok::<_, Infallible>((name.to_string(), email.to_string())))
            .is_some()
    }

    /// Existence check, input decode, merge and snapshot in one critical section.
    /// `None` if `id` is not stored (`decode` is not called); `Some(Err)` if `decode` fails.
    pub fn update_with<F, E>(&self, id: i64, decode: F) -> Option<Result<User, E>>
    where
        F: FnOnce() -> Result<(String, String), E>,
    {
        let mut inner = self.lock();
        let user = inner.users.get_mut(&id)?;

        let (name, email) = match decode() {
            Ok(fields) => fields,
            Err(e) => return Some(Err(e)),
        };
        if !name.is_empty() {
            user.name = name;
        }
        if !email.is_empty() {
            user.email = email;
        }
        Some(Ok(user.clone()))
    }

    /// Snapshot of every record, in no particular order.
    pub fn list(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new(Box::new(RandomIds))
    }
}
