//! Shared install-status registry observed by every screen.
//!
//! The registry is the single writer-of-record for what the UI shows about a
//! package: its [`InstallStatus`] and, while bytes are transferring, its
//! [`DownloadProgress`]. It is constructed once by the runtime and shared by
//! `Arc`; screens observe it through [`StatusSubscription`]s instead of
//! polling.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;

use super::types::{DownloadProgress, InstallStatus};

/// Buffered events per subscriber before the slowest one starts lagging.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Change published by the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A package's status changed.
    Status {
        /// Package id.
        id: String,
        /// New status.
        status: InstallStatus,
    },
    /// A package's download progress changed; `None` means the entry was cleared.
    Progress {
        /// Package id.
        id: String,
        /// New progress, or `None` once the download finished or failed.
        progress: Option<DownloadProgress>,
    },
}

impl RegistryEvent {
    /// Package id the event refers to.
    #[must_use]
    pub fn package_id(&self) -> &str {
        match self {
            Self::Status { id, .. } | Self::Progress { id, .. } => id,
        }
    }
}

/// Errors surfaced to subscribers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The registry was dropped.
    #[error("install status registry closed")]
    Closed,
    /// The subscriber fell behind; the given number of events were dropped.
    /// Receiving again continues with the oldest retained event.
    #[error("subscriber lagged by {0} events")]
    Lagged(u64),
}

/// Process-wide map of package id to install status and download progress.
pub struct InstallStatusRegistry {
    /// Resolved statuses. Absence means [`InstallStatus::Unknown`].
    statuses: DashMap<String, InstallStatus>,
    /// Progress of downloads currently transferring bytes.
    progress: DashMap<String, DownloadProgress>,
    /// Change notifications.
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for InstallStatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallStatusRegistry {
    /// Create an empty registry with the default event buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create an empty registry buffering `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            statuses: DashMap::new(),
            progress: DashMap::new(),
            events,
        }
    }

    /// Current status of `id`; [`InstallStatus::Unknown`] when never resolved.
    #[must_use]
    pub fn get(&self, id: &str) -> InstallStatus {
        self.statuses.get(id).map_or(InstallStatus::Unknown, |s| *s)
    }

    /// Status of `id` if it was ever resolved.
    #[must_use]
    pub fn resolved(&self, id: &str) -> Option<InstallStatus> {
        self.statuses.get(id).map(|s| *s)
    }

    /// What: Overwrite the status of `id`.
    ///
    /// Inputs:
    /// - `id`: Package id
    /// - `status`: New status
    ///
    /// Output:
    /// - `true` when the visible status changed and an event was published.
    ///
    /// Details:
    /// - Writing the value already stored is a no-op without notification.
    /// - The first write of `Unknown` only marks the id as resolved; observers
    ///   already treat absence as `Unknown`, so nothing is published.
    /// - The event is sent while the entry is locked, so per-package events
    ///   arrive in write order.
    pub fn set(&self, id: &str, status: InstallStatus) -> bool {
        match self.statuses.entry(id.to_string()) {
            Entry::Occupied(mut e) => {
                if *e.get() == status {
                    return false;
                }
                e.insert(status);
                self.publish(RegistryEvent::Status {
                    id: id.to_string(),
                    status,
                });
                true
            }
            Entry::Vacant(e) => {
                e.insert(status);
                if status == InstallStatus::Unknown {
                    return false;
                }
                self.publish(RegistryEvent::Status {
                    id: id.to_string(),
                    status,
                });
                true
            }
        }
    }

    /// What: Write `status` only if `id` still holds `expected`.
    ///
    /// Inputs:
    /// - `id`: Package id
    /// - `expected`: Status read earlier (`Unknown` also matches an absent id)
    /// - `status`: New status
    ///
    /// Output:
    /// - `true` when `expected` matched and `status` is now stored.
    ///
    /// Details:
    /// - Compare and write happen under the entry lock, so a result computed
    ///   across suspension points never overwrites a newer status.
    /// - Publishes like [`Self::set`].
    pub fn set_if(&self, id: &str, expected: InstallStatus, status: InstallStatus) -> bool {
        match self.statuses.entry(id.to_string()) {
            Entry::Occupied(mut e) => {
                if *e.get() != expected {
                    return false;
                }
                if expected != status {
                    e.insert(status);
                    self.publish(RegistryEvent::Status {
                        id: id.to_string(),
                        status,
                    });
                }
                true
            }
            Entry::Vacant(e) => {
                if expected != InstallStatus::Unknown {
                    return false;
                }
                e.insert(status);
                if status != InstallStatus::Unknown {
                    self.publish(RegistryEvent::Status {
                        id: id.to_string(),
                        status,
                    });
                }
                true
            }
        }
    }

    /// Current download progress of `id`, if bytes are transferring.
    #[must_use]
    pub fn progress(&self, id: &str) -> Option<DownloadProgress> {
        self.progress.get(id).map(|p| *p)
    }

    /// Record download progress for `id`; publishes only when the value changed.
    pub fn set_progress(&self, id: &str, progress: DownloadProgress) {
        match self.progress.entry(id.to_string()) {
            Entry::Occupied(mut e) => {
                if *e.get() == progress {
                    return;
                }
                e.insert(progress);
                self.publish(RegistryEvent::Progress {
                    id: id.to_string(),
                    progress: Some(progress),
                });
            }
            Entry::Vacant(e) => {
                e.insert(progress);
                self.publish(RegistryEvent::Progress {
                    id: id.to_string(),
                    progress: Some(progress),
                });
            }
        }
    }

    /// Remove the progress entry of `id`; publishes only if one existed.
    pub fn clear_progress(&self, id: &str) {
        if self.progress.remove(id).is_some() {
            self.publish(RegistryEvent::Progress {
                id: id.to_string(),
                progress: None,
            });
        }
    }

    /// All resolved statuses sorted by package id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, InstallStatus)> {
        let mut out: Vec<(String, InstallStatus)> = self
            .statuses
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Subscribe to changes of every package.
    #[must_use]
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            receiver: self.events.subscribe(),
            filter: None,
        }
    }

    /// Subscribe to changes of a single package.
    #[must_use]
    pub fn subscribe_package(&self, id: &str) -> StatusSubscription {
        StatusSubscription {
            receiver: self.events.subscribe(),
            filter: Some(id.to_string()),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Broadcast an event; having no subscribers is normal.
    fn publish(&self, event: RegistryEvent) {
        tracing::trace!(?event, "registry change");
        let _ = self.events.send(event);
    }
}

/// Receiver of registry changes, optionally filtered to one package.
pub struct StatusSubscription {
    /// Underlying broadcast receiver.
    receiver: broadcast::Receiver<RegistryEvent>,
    /// Package id to keep; `None` keeps everything.
    filter: Option<String>,
}

impl StatusSubscription {
    /// Whether `event` passes this subscription's filter.
    fn wants(&self, event: &RegistryEvent) -> bool {
        self.filter
            .as_deref()
            .is_none_or(|id| event.package_id() == id)
    }

    /// What: Wait for the next matching change.
    ///
    /// Output:
    /// - The next event for the subscribed package(s).
    ///
    /// # Errors
    /// - `SubscriptionError::Lagged(n)` when `n` events were dropped; the
    ///   subscription stays usable.
    /// - `SubscriptionError::Closed` once the registry is gone.
    pub async fn recv(&mut self) -> Result<RegistryEvent, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.wants(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "registry subscriber lagged");
                    return Err(SubscriptionError::Lagged(n));
                }
            }
        }
    }

    /// What: Take the next matching change without waiting.
    ///
    /// Output:
    /// - `Ok(Some(event))` when one is buffered, `Ok(None)` when drained.
    ///
    /// # Errors
    /// - Same as [`StatusSubscription::recv`].
    pub fn try_recv(&mut self) -> Result<Option<RegistryEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.wants(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Err(SubscriptionError::Lagged(n));
                }
            }
        }
    }

    /// Drain every buffered matching event, skipping over lag gaps.
    pub fn drain(&mut self) -> Vec<RegistryEvent> {
        let mut out = Vec::new();
        loop {
            match self.try_recv() {
                Ok(Some(event)) => out.push(event),
                Ok(None) | Err(SubscriptionError::Closed) => return out,
                Err(SubscriptionError::Lagged(_)) => {}
            }
        }
    }
}
