//! Observer fan-out shared by every component that publishes state changes.
//!
//! An [`ObserverSet`] holds a list of observers and delivers each change to
//! all of them, in registration order, synchronously. Delivery works on a
//! snapshot of the registered observers taken when the change happens, so an
//! observer registered during a fan-out may miss that change.
//!
//! Observers are isolated from one another: an observer that returns an
//! error or panics is logged and skipped, and the remaining observers still
//! receive the change. Nothing is ever propagated back to the notifier.
//!
//! Identity is pointer identity of the `Arc`. Subscribing the same `Arc`
//! twice keeps a single entry.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use thiserror::Error;
use tokio::sync::mpsc;

/// Failure reported by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// The observer's downstream receiver is gone; the set prunes it.
    #[error("observer channel closed")]
    Closed,

    /// The observer failed to handle the change.
    #[error("observer failed: {0}")]
    Failed(String),
}

impl ObserverError {
    /// Creates a handling failure.
    pub fn failed(message: impl Into<String>) -> Self {
        ObserverError::Failed(message.into())
    }
}

/// Receiver of change notifications.
///
/// Implemented for plain closures, so most call sites can write:
///
/// ```ignore
/// let sub = orchestrator.subscribe(Arc::new(|state: &SessionState| {
///     println!("active = {}", state.is_active);
///     Ok(())
/// }));
/// ```
pub trait Observer<T>: Send + Sync {
    /// Handle one change.
    fn on_change(&self, value: &T) -> Result<(), ObserverError>;

    /// Observer name for logging.
    fn name(&self) -> &str {
        "observer"
    }
}

impl<T, F> Observer<T> for F
where
    F: Fn(&T) -> Result<(), ObserverError> + Send + Sync,
{
    fn on_change(&self, value: &T) -> Result<(), ObserverError> {
        self(value)
    }
}

/// Observer that forwards every change into an unbounded channel.
///
/// Dropping the receiver closes the subscription: the next fan-out sees
/// [`ObserverError::Closed`] and removes the observer.
pub struct ChannelObserver<T> {
    sender: mpsc::UnboundedSender<T>,
}

impl<T> ChannelObserver<T> {
    /// Creates the observer and its receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl<T: Clone + Send + Sync> Observer<T> for ChannelObserver<T> {
    fn on_change(&self, value: &T) -> Result<(), ObserverError> {
        self.sender
            .send(value.clone())
            .map_err(|_| ObserverError::Closed)
    }

    fn name(&self) -> &str {
        "channel"
    }
}

/// Handle returned by `subscribe`; call [`Subscription::unsubscribe`] to
/// stop receiving changes.
///
/// Dropping the handle does not unsubscribe.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Removes the observer from the set it was registered with.
    ///
    /// A no-op when the set has since been cleared or dropped.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Entry<T> {
    id: u64,
    observer: Arc<dyn Observer<T>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            observer: Arc::clone(&self.observer),
        }
    }
}

struct Registry<T> {
    entries: RwLock<Vec<Entry<T>>>,
    next_id: AtomicU64,
}

impl<T> Registry<T> {
    fn remove_id(&self, id: u64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }
}

fn same_observer<T>(a: &Arc<dyn Observer<T>>, b: &Arc<dyn Observer<T>>) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Ordered, de-duplicated set of observers with isolated fan-out.
pub struct ObserverSet<T> {
    registry: Arc<Registry<T>>,
}

impl<T: 'static> ObserverSet<T> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                entries: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers an observer.
    ///
    /// Registering an `Arc` that is already present does not add a second
    /// entry; the returned handle refers to the existing one.
    pub fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        let id = {
            let mut entries = self
                .registry
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match entries.iter().find(|e| same_observer(&e.observer, &observer)) {
                Some(existing) => existing.id,
                None => {
                    let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
                    entries.push(Entry { id, observer });
                    id
                }
            }
        };

        let registry: Weak<Registry<T>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.remove_id(id);
            }
        })
    }

    /// Registers an observer unless it is already present.
    ///
    /// Returns `true` when a new entry was added.
    pub fn insert(&self, observer: Arc<dyn Observer<T>>) -> bool {
        let mut entries = self
            .registry
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|e| same_observer(&e.observer, &observer)) {
            return false;
        }
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        entries.push(Entry { id, observer });
        true
    }

    /// Removes an observer by identity. Returns `true` when it was present.
    pub fn remove(&self, observer: &Arc<dyn Observer<T>>) -> bool {
        let mut entries = self
            .registry
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| !same_observer(&e.observer, observer));
        entries.len() != before
    }

    /// Removes every observer.
    pub fn clear(&self) {
        self.registry
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.registry
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `value` to every observer registered right now.
    ///
    /// Returns how many observers handled the change successfully.
    pub fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<Entry<T>> = self
            .registry
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.observer.on_change(value)));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(ObserverError::Closed)) => closed.push(entry.id),
                Ok(Err(err)) => {
                    tracing::warn!(observer = entry.observer.name(), error = %err, "Observer failed");
                }
                Err(_) => {
                    tracing::error!(observer = entry.observer.name(), "Observer panicked");
                }
            }
        }

        for id in closed {
            self.registry.remove_id(id);
        }

        delivered
    }
}

impl<T: 'static> Default for ObserverSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
