//! Out-of-band dispatch of forced-eviction callbacks
//!
//! The cache hands each forced eviction to a [`Notifier`] as an
//! [`EvictionNotice`] that owns a copy of the key and its callbacks. Notices
//! are queued while the cache lock is still held, so the queue order is the
//! eviction order. Queueing never blocks: the channel is unbounded and a
//! configurable backlog only triggers a warning. A dedicated worker thread
//! drains the queue and runs the callbacks in registration order. The worker
//! never touches cache state, so a callback may call back into the cache.

use super::stats::CacheStatistics;
use crate::error::{CacheError, Result};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Callback invoked with the key of an entry removed by capacity pressure
///
/// Two callbacks are equal when they share one allocation: clones of a
/// callback compare equal, separately constructed callbacks do not.
///
/// ```rust
/// use evicache::EvictionCallback;
///
/// let cb = EvictionCallback::new(|key| println!("evicted {}", key));
/// assert_eq!(cb, cb.clone());
/// assert_ne!(cb, EvictionCallback::new(|_| {}));
/// ```
#[derive(Clone)]
pub struct EvictionCallback(Arc<dyn Fn(&str) + Send + Sync>);

impl EvictionCallback {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the callback for `key`
    pub fn invoke(&self, key: &str) {
        (self.0)(key)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EvictionCallback {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for EvictionCallback {}

impl fmt::Debug for EvictionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EvictionCallback").field(&self.addr()).finish()
    }
}

/// A forced eviction, detached from the cache
#[derive(Debug)]
pub(crate) struct EvictionNotice {
    key: String,
    callbacks: Vec<EvictionCallback>,
    operation: &'static str,
}

impl EvictionNotice {
    pub(crate) fn new(
        key: String,
        callbacks: Vec<EvictionCallback>,
        operation: &'static str,
    ) -> Self {
        Self {
            key,
            callbacks,
            operation,
        }
    }
}

enum Message {
    Notice(EvictionNotice),
    Flush(Sender<()>),
}

/// Owner of the callback worker thread
pub(crate) struct Notifier {
    sender: Option<Sender<Message>>,
    worker: Option<JoinHandle<()>>,
    worker_id: ThreadId,
    /// Notices queued but not yet dispatched
    backlog: Arc<AtomicUsize>,
    backlog_warning: usize,
}

impl Notifier {
    /// Start a worker thread named `thread_name`. A warning is logged each time
    /// the backlog grows past `backlog_warning` notices.
    pub(crate) fn spawn(
        thread_name: &str,
        backlog_warning: usize,
        stats: Arc<CacheStatistics>,
    ) -> Result<Self> {
        if backlog_warning == 0 {
            return Err(CacheError::invalid_argument(
                "notifier backlog warning must be > 0",
            ));
        }
        let (sender, receiver) = mpsc::channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        let worker_backlog = Arc::clone(&backlog);
        let worker = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || run(receiver, stats, worker_backlog))?;
        let worker_id = worker.thread().id();

        log::debug!(
            "Eviction notifier '{}' started (backlog warning={})",
            thread_name,
            backlog_warning
        );

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            worker_id,
            backlog,
            backlog_warning,
        })
    }

    /// Queue a notice for dispatch without blocking. Returns `false` if the
    /// worker has stopped.
    pub(crate) fn notify(&self, notice: EvictionNotice) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        let backlog = self.backlog.fetch_add(1, Ordering::Relaxed) + 1;
        if backlog == self.backlog_warning + 1 {
            log::warn!(
                "Eviction notifier backlog exceeded {} notices",
                self.backlog_warning
            );
        }
        match sender.send(Message::Notice(notice)) {
            Ok(()) => true,
            Err(mpsc::SendError(message)) => {
                self.backlog.fetch_sub(1, Ordering::Relaxed);
                if let Message::Notice(notice) = message {
                    log::warn!(
                        "Eviction notifier stopped; dropping notice for key '{}'",
                        notice.key
                    );
                }
                false
            }
        }
    }

    /// Number of notices queued but not yet dispatched
    pub(crate) fn pending(&self) -> usize {
        self.backlog.load(Ordering::Relaxed)
    }

    /// Wait until every notice queued before this call has been dispatched
    ///
    /// Returns immediately when called from a callback.
    pub(crate) fn flush(&self) {
        if self.on_worker() {
            return;
        }
        let Some(sender) = self.sender.as_ref() else {
            return;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    fn on_worker(&self) -> bool {
        thread::current().id() == self.worker_id
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain what is left and exit.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if !self.on_worker() && worker.join().is_err() {
                log::error!("Eviction notifier worker terminated abnormally");
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("running", &self.sender.is_some())
            .field("pending", &self.pending())
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

fn run(receiver: Receiver<Message>, stats: Arc<CacheStatistics>, backlog: Arc<AtomicUsize>) {
    for message in receiver {
        match message {
            Message::Notice(notice) => {
                dispatch(&notice, &stats);
                backlog.fetch_sub(1, Ordering::Relaxed);
            }
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    log::debug!("Eviction notifier stopped");
}

/// Run every callback of `notice`; a panicking callback does not stop the rest
fn dispatch(notice: &EvictionNotice, stats: &CacheStatistics) {
    for callback in &notice.callbacks {
        match panic::catch_unwind(AssertUnwindSafe(|| callback.invoke(&notice.key))) {
            Ok(()) => stats.record_callback_invoked(),
            Err(payload) => {
                let failure = CacheError::callback_failure(
                    notice.key.as_str(),
                    panic_message(payload.as_ref()),
                );
                log::error!("{}: {}", notice.operation, failure);
                stats.record_callback_failure();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
