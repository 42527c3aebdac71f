#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The connection registry: an in-process bijection between a connected
//! user's identity and the live session handle the session gateway owns for
//! it. Purely in-memory, never fails, and enforces single-session-per-user by
//! evicting whatever handle previously occupied a slot.

use std::hash::Hash;

use ahash::AHashMap;
use chat_common::UserId;
use parking_lot::RwLock;

/// A handle stored in the registry. Handles are compared and looked back up
/// by [`Handle::Id`], never by value, since the gateway's actual session
/// object is not `Eq`.
pub trait Handle: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync;

    fn id(&self) -> Self::Id;
}

struct Inner<H: Handle> {
    user_to_handle: AHashMap<UserId, H>,
    handle_to_user: AHashMap<H::Id, UserId>,
}

impl<H: Handle> Default for Inner<H> {
    fn default() -> Self {
        Self {
            user_to_handle: AHashMap::default(),
            handle_to_user: AHashMap::default(),
        }
    }
}

/// Bidirectional `userId <-> handle` map with a single-session-per-user
/// discipline. All operations are serialized behind one lock so that the two
/// directions never observe an inconsistent snapshot of each other.
pub struct ConnectionRegistry<H: Handle> {
    inner: RwLock<Inner<H>>,
}

impl<H: Handle> Default for ConnectionRegistry<H> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl<H: Handle> ConnectionRegistry<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handle` for `userId`, returning whatever handle previously
    /// occupied that slot (if any) so the caller can release it. The prior
    /// handle is evicted from both directions before the new one is visible.
    pub fn add(&self, user_id: UserId, handle: H) -> Option<H> {
        let mut inner = self.inner.write();

        let evicted = inner.user_to_handle.remove(&user_id);
        if let Some(ref evicted) = evicted {
            inner.handle_to_user.remove(&evicted.id());
        }

        inner.handle_to_user.insert(handle.id(), user_id.clone());
        inner.user_to_handle.insert(user_id, handle);

        evicted
    }

    /// Removes `userId`'s binding. A no-op (not an error) if absent.
    pub fn remove(&self, user_id: &UserId) -> Option<H> {
        let mut inner = self.inner.write();
        let handle = inner.user_to_handle.remove(user_id)?;
        inner.handle_to_user.remove(&handle.id());
        Some(handle)
    }

    pub fn handle_of(&self, user_id: &UserId) -> Option<H> {
        self.inner.read().user_to_handle.get(user_id).cloned()
    }

    pub fn user_of(&self, handle_id: &H::Id) -> Option<UserId> {
        self.inner.read().handle_to_user.get(handle_id).cloned()
    }

    pub fn has(&self, user_id: &UserId) -> bool {
        self.inner.read().user_to_handle.contains_key(user_id)
    }

    pub fn count(&self) -> usize {
        self.inner.read().user_to_handle.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.user_to_handle.clear();
        inner.handle_to_user.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Debug)]
    struct TestHandle(u64);

    impl Handle for TestHandle {
        type Id = u64;

        fn id(&self) -> Self::Id {
            self.0
        }
    }

    #[test]
    fn add_then_lookup_both_directions() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new("u_alice");
        registry.add(user.clone(), TestHandle(1));

        assert_eq!(registry.handle_of(&user), Some(TestHandle(1)));
        assert_eq!(registry.user_of(&1), Some(user));
    }

    #[test]
    fn remove_is_idempotent() {
        let registry: ConnectionRegistry<TestHandle> = ConnectionRegistry::new();
        let user = UserId::new("u_ghost");
        assert_eq!(registry.remove(&user), None);
        assert_eq!(registry.remove(&user), None);
    }

    #[test]
    fn second_add_evicts_the_first_handle_from_both_maps() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new("u_alice");

        registry.add(user.clone(), TestHandle(1));
        let evicted = registry.add(user.clone(), TestHandle(2));

        assert_eq!(evicted, Some(TestHandle(1)));
        assert_eq!(registry.handle_of(&user), Some(TestHandle(2)));
        assert_eq!(registry.user_of(&1), None);
        assert_eq!(registry.user_of(&2), Some(user));
    }

    #[test]
    fn at_most_one_handle_per_user() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new("u_alice");
        registry.add(user.clone(), TestHandle(1));
        registry.add(user.clone(), TestHandle(2));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn clear_empties_both_maps() {
        let registry = ConnectionRegistry::new();
        registry.add(UserId::new("u_alice"), TestHandle(1));
        registry.add(UserId::new("u_bob"), TestHandle(2));
        registry.clear();
        assert_eq!(registry.count(), 0);
        assert_eq!(registry.user_of(&1), None);
    }

    #[test]
    fn has_reflects_current_membership() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new("u_alice");
        assert!(!registry.has(&user));
        registry.add(user.clone(), TestHandle(1));
        assert!(registry.has(&user));
        registry.remove(&user);
        assert!(!registry.has(&user));
    }
}
