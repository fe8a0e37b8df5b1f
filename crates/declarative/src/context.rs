//! Reconcile context and callback traits
//!
//! Everything a reconciler call needs is passed explicitly through
//! [`ReconcileContext`]: the client, polling bounds, a cancellation token and
//! an optional observer. There is no process-wide provider state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender};

use crate::client::RemoteClient;
use crate::poller::{Observation, PollConfig};
use crate::types::ApplyResult;

/// Cooperative cancellation shared between the caller and the poller.
///
/// Cancelling drops the internal sender, which disconnects every clone of
/// the receiver, so a poller blocked in `select!` wakes immediately.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that disconnects on cancellation
    pub(crate) fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives each observation made while polling for readiness
pub trait PollObserver: Send + Sync {
    /// Called after every read, `attempt` starting at 1
    fn on_poll(&self, id: &str, attempt: u32, observation: &Observation<'_>);
}

/// Context passed to every reconciler operation
#[derive(Clone)]
pub struct ReconcileContext<'a> {
    pub client: &'a dyn RemoteClient,
    pub poll: PollConfig,
    pub cancel: CancelToken,
    pub observer: Option<&'a dyn PollObserver>,
}

impl<'a> ReconcileContext<'a> {
    /// Create a context with default polling and a fresh cancel token
    pub fn new(client: &'a dyn RemoteClient) -> Self {
        Self {
            client,
            poll: PollConfig::default(),
            cancel: CancelToken::new(),
            observer: None,
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn PollObserver) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Progress callback for plan execution
///
/// Called from executor worker threads, hence `Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any resource is applied
    fn on_start(&self, count: usize);

    /// Called when starting to apply a single resource
    fn on_resource_start(&self, address: &str, action: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&self, address: &str, result: &ApplyResult);

    /// Called after every resource has been applied
    fn on_complete(&self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&self, _count: usize) {}
    fn on_resource_start(&self, _address: &str, _action: &str) {}
    fn on_resource_complete(&self, _address: &str, _result: &ApplyResult) {}
    fn on_complete(&self) {}
}
