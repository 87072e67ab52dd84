//! Change notifications
//!
//! A [`ChangeFeed`] fans events out to every callback registered for the
//! event's resource kind. Registration returns a [`Subscription`] guard;
//! dropping it removes the callback.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde::{Deserialize, Serialize};

/// Resource families that can change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Entries,
    Categories,
    SavedLinks,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Entries => "entries",
            Self::Categories => "categories",
            Self::SavedLinks => "saved_links",
        })
    }
}

/// A change to one resource, or to a whole kind when `id` is `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ResourceKind,
    pub id: Option<String>,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    #[must_use]
    pub const fn all(kind: ResourceKind) -> Self {
        Self { kind, id: None }
    }
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    callbacks: BTreeMap<u64, (ResourceKind, Callback)>,
}

/// Publish/subscribe hub for change events
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Arc<Mutex<Registry>>,
}

impl fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of `kind`
    pub fn subscribe(
        &self,
        kind: ResourceKind,
        callback: Box<dyn Fn(&ChangeEvent) + Send + Sync>,
    ) -> Subscription {
        let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, (kind, Arc::from(callback)));
        log::trace!("subscription {id} registered for {kind}");

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to the matching subscribers, in registration order
    pub fn publish(&self, event: &ChangeEvent) {
        // Collect first so callbacks may subscribe or unsubscribe
        let targets: Vec<Callback> = {
            let registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .callbacks
                .values()
                .filter(|(kind, _)| *kind == event.kind)
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };

        log::debug!("publishing {} change to {} subscriber(s)", event.kind, targets.len());
        for callback in targets {
            callback(event);
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }
}

/// Live registration on a [`ChangeFeed`]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Explicit form of dropping the guard
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .remove(&self.id);
        }
    }
}
