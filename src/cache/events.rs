//! Lifecycle Events Module
//!
//! Optional callbacks fired when items are added, deleted, updated,
//! refreshed or expire.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{trace, warn};

use crate::cache::CacheItem;

// == Event Kind ==
/// The lifecycle transition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Add,
    Delete,
    Update,
    Refresh,
    Expire,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Add => "add",
            EventKind::Delete => "delete",
            EventKind::Update => "update",
            EventKind::Refresh => "refresh",
            EventKind::Expire => "expire",
        };
        f.write_str(name)
    }
}

/// Callback invoked with the affected item.
///
/// A returned error is logged and otherwise ignored by the cache.
pub type EventHandler<V> = Arc<dyn Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync>;

// == Event Config ==
/// One optional handler per [`EventKind`].
///
/// ```
/// use near_cache::cache::EventConfig;
///
/// let events = EventConfig::<String>::new()
///     .on_delete(|item| {
///         println!("deleted {}", item.value);
///         Ok(())
///     });
/// assert!(!events.is_empty());
/// ```
pub struct EventConfig<V> {
    on_add: Option<EventHandler<V>>,
    on_delete: Option<EventHandler<V>>,
    on_update: Option<EventHandler<V>>,
    on_refresh: Option<EventHandler<V>>,
    on_expire: Option<EventHandler<V>>,
}

impl<V> EventConfig<V> {
    /// Creates a config with no handlers registered.
    pub fn new() -> Self {
        Self {
            on_add: None,
            on_delete: None,
            on_update: None,
            on_refresh: None,
            on_expire: None,
        }
    }

    pub fn on_add<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_add = Some(Arc::new(f));
        self
    }

    pub fn on_delete<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_delete = Some(Arc::new(f));
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
        self
    }

    pub fn on_refresh<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_refresh = Some(Arc::new(f));
        self
    }

    pub fn on_expire<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheItem<V>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_expire = Some(Arc::new(f));
        self
    }

    /// Returns the handler registered for `kind`, if any.
    pub fn handler(&self, kind: EventKind) -> Option<&EventHandler<V>> {
        match kind {
            EventKind::Add => self.on_add.as_ref(),
            EventKind::Delete => self.on_delete.as_ref(),
            EventKind::Update => self.on_update.as_ref(),
            EventKind::Refresh => self.on_refresh.as_ref(),
            EventKind::Expire => self.on_expire.as_ref(),
        }
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handler(kind).is_some()
    }

    /// Returns true when no handler is registered at all.
    pub fn is_empty(&self) -> bool {
        self.on_add.is_none()
            && self.on_delete.is_none()
            && self.on_update.is_none()
            && self.on_refresh.is_none()
            && self.on_expire.is_none()
    }

    // == Dispatch ==
    /// Invokes the handler for `kind` with `item`.
    ///
    /// Missing handlers are a no-op. Must be called without holding the
    /// cache lock, handlers are free to call back into the cache.
    pub fn dispatch(&self, kind: EventKind, item: &CacheItem<V>) {
        let Some(handler) = self.handler(kind) else {
            trace!(event = %kind, "no handler registered");
            return;
        };

        trace!(event = %kind, "dispatching event");
        if let Err(err) = handler(item) {
            warn!(event = %kind, error = %err, "event handler failed");
        }
    }
}

impl<V> Default for EventConfig<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for EventConfig<V> {
    fn clone(&self) -> Self {
        Self {
            on_add: self.on_add.clone(),
            on_delete: self.on_delete.clone(),
            on_update: self.on_update.clone(),
            on_refresh: self.on_refresh.clone(),
            on_expire: self.on_expire.clone(),
        }
    }
}

impl<V> fmt::Debug for EventConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventConfig")
            .field("on_add", &self.on_add.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .field("on_update", &self.on_update.is_some())
            .field("on_refresh", &self.on_refresh.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}
