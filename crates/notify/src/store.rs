//! Local notification state.
//!
//! [`NotificationStore`] owns the newest-first list and the unread count.
//! User actions confirm with the backend first and mutate local state
//! only on success; push events apply immediately (the backend already
//! confirmed them to some client). Every mutation keeps the unread count
//! in lockstep with the list, and applying the same mutation twice is a
//! no-op.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use glowdesk_core::notification::Notification;
use glowdesk_core::types::DbId;

use crate::api::NotificationApi;
use crate::messages::PushEvent;

/// Broadcast channel capacity for store change events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change feed the UI layer subscribes to for re-renders and
/// platform-level alerts.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A notification arrived over the push channel. Carries the entry so
    /// subscribers can raise an alert without re-reading the list.
    NewArrival(Notification),
    /// The list or unread count changed in some other way.
    Changed,
}

/// List plus incrementally-maintained unread counter. Mutations return
/// whether they changed anything so no-ops skip event publication.
#[derive(Default)]
struct FeedState {
    items: Vec<Notification>,
    unread: usize,
}

impl FeedState {
    /// Replace the whole feed from a backend fetch. The unread counter is
    /// recomputed from the entries; a disagreeing server counter is logged.
    fn replace(&mut self, items: Vec<Notification>, server_unread: usize) {
        let unread = items.iter().filter(|n| !n.is_read).count();
        if unread != server_unread {
            tracing::warn!(
                local = unread,
                server = server_unread,
                "Server unread counter disagrees with feed contents"
            );
        }
        self.items = items;
        self.unread = unread;
    }

    /// Prepend a new entry. Ignores an id that is already present, so a
    /// replayed push event cannot double-insert.
    fn insert_new(&mut self, notification: Notification) -> bool {
        if self.items.iter().any(|n| n.id == notification.id) {
            return false;
        }
        if !notification.is_read {
            self.unread += 1;
        }
        self.items.insert(0, notification);
        true
    }

    fn mark_read(&mut self, id: DbId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(entry) if !entry.is_read => {
                entry.is_read = true;
                self.unread -= 1;
                true
            }
            _ => false,
        }
    }

    fn mark_all_read(&mut self) -> bool {
        if self.unread == 0 {
            return false;
        }
        for entry in &mut self.items {
            entry.is_read = true;
        }
        self.unread = 0;
        true
    }

    fn remove(&mut self, id: DbId) -> bool {
        match self.items.iter().position(|n| n.id == id) {
            Some(index) => {
                if !self.items[index].is_read {
                    self.unread -= 1;
                }
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.items.clear();
        self.unread = 0;
        true
    }
}

/// Shared notification state, combining the initial pull with ongoing
/// push updates.
pub struct NotificationStore {
    api: Arc<dyn NotificationApi>,
    state: RwLock<FeedState>,
    events: broadcast::Sender<StoreEvent>,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            state: RwLock::new(FeedState::default()),
            events,
        }
    }

    /// Subscribe to store changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the list, newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.items.clone()
    }

    /// Current unread count.
    pub async fn unread_count(&self) -> usize {
        self.state.read().await.unread
    }

    /// Replace the local feed from a backend fetch. Used on first
    /// authentication and when the user re-opens the notification panel.
    pub async fn refresh(&self) {
        match self.api.fetch_all().await {
            Ok(feed) => {
                self.state
                    .write()
                    .await
                    .replace(feed.notifications, feed.unread_count);
                self.publish(StoreEvent::Changed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch notifications");
            }
        }
    }

    /// Mark one entry read: backend first, local state on success.
    pub async fn mark_as_read(&self, id: DbId) {
        if let Err(e) = self.api.mark_read(id).await {
            tracing::warn!(id, error = %e, "Failed to mark notification read");
            return;
        }
        if self.state.write().await.mark_read(id) {
            self.publish(StoreEvent::Changed);
        }
    }

    /// Mark every entry read: backend first, local state on success.
    pub async fn mark_all_as_read(&self) {
        if let Err(e) = self.api.mark_all_read().await {
            tracing::warn!(error = %e, "Failed to mark all notifications read");
            return;
        }
        if self.state.write().await.mark_all_read() {
            self.publish(StoreEvent::Changed);
        }
    }

    /// Delete one entry: backend first, local state on success.
    pub async fn delete_notification(&self, id: DbId) {
        if let Err(e) = self.api.delete(id).await {
            tracing::warn!(id, error = %e, "Failed to delete notification");
            return;
        }
        if self.state.write().await.remove(id) {
            self.publish(StoreEvent::Changed);
        }
    }

    /// Empty the list: backend first, local state on success.
    pub async fn clear_all(&self) {
        if let Err(e) = self.api.clear_all().await {
            tracing::warn!(error = %e, "Failed to clear notifications");
            return;
        }
        if self.state.write().await.clear() {
            self.publish(StoreEvent::Changed);
        }
    }

    /// Apply a push event immediately, in arrival order.
    ///
    /// Replayed events are no-ops: nothing is published when the state
    /// did not change.
    pub async fn apply_event(&self, event: PushEvent) {
        let mut state = self.state.write().await;
        let publish = match event {
            PushEvent::NewNotification(notification) => state
                .insert_new(notification.clone())
                .then(|| StoreEvent::NewArrival(notification)),
            PushEvent::NotificationRead { id } => {
                state.mark_read(id).then_some(StoreEvent::Changed)
            }
            PushEvent::AllNotificationsRead => {
                state.mark_all_read().then_some(StoreEvent::Changed)
            }
            PushEvent::NotificationDeleted { id } => {
                state.remove(id).then_some(StoreEvent::Changed)
            }
            PushEvent::AllNotificationsCleared => state.clear().then_some(StoreEvent::Changed),
        };
        drop(state);

        if let Some(event) = publish {
            self.publish(event);
        }
    }

    /// Publish a change event. Zero subscribers is not an error.
    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }
}
