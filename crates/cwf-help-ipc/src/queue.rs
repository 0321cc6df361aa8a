//! Named request queues connecting a help viewer proxy with its remote viewer.
//!
//! Each browser window owns at most one inbound [`InvocationQueue`] per
//! purpose, registered under a window name in a shared [`QueueRegistry`].
//! Other windows look the name up and receive a [`QueueHandle`], the sending
//! side. A handle reports the queue dead once the owner closes it, drops it,
//! or stops refreshing its keep-alive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::request::{InvocationRequest, ViewerCommand};

/// Default interval after which a queue that has not been touched is considered dead.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(10);

/// Name of the request queue owned by the help window of a page.
#[must_use]
pub fn window_name(page_id: &str) -> String {
    format!("help{page_id}")
}

struct QueueShared {
    name: String,
    sender: mpsc::UnboundedSender<InvocationRequest>,
    closed: AtomicBool,
    last_keep_alive: Mutex<Instant>,
    keep_alive: Option<Duration>,
}

impl QueueShared {
    fn expired(&self) -> bool {
        let Some(keep_alive) = self.keep_alive else {
            return false;
        };
        let last = *self
            .last_keep_alive
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.elapsed() > keep_alive
    }
}

/// Sending side of a named request queue.
#[derive(Clone)]
pub struct QueueHandle {
    shared: Arc<QueueShared>,
}

impl std::fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle")
            .field("name", &self.shared.name)
            .field("closed", &self.shared.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl QueueHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// True while the owning window still services this queue.
    ///
    /// A queue whose keep-alive interval has elapsed is marked closed the
    /// first time it is observed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        if self.shared.closed.load(Ordering::Acquire) {
            return false;
        }

        if self.shared.expired() {
            debug!("Request queue {} missed its keep-alive", self.shared.name);
            self.shared.closed.store(true, Ordering::Release);
            return false;
        }

        !self.shared.sender.is_closed()
    }

    /// Refresh the keep-alive timestamp.
    pub fn touch(&self) {
        *self
            .shared
            .last_keep_alive
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Deliver a request to the queue owner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the queue is no longer alive.
    pub fn send_request(&self, request: InvocationRequest) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::QueueClosed(self.shared.name.clone()));
        }

        debug!(
            "Sending {} to request queue {}",
            request.method_name, self.shared.name
        );
        self.shared
            .sender
            .send(request)
            .map_err(|_| Error::QueueClosed(self.shared.name.clone()))
    }

    /// Encode and deliver a viewer command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be encoded or the queue is closed.
    pub fn send_command(&self, command: &ViewerCommand) -> Result<()> {
        self.send_request(command.to_request()?)
    }

    fn same_queue(&self, other: &QueueHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

/// Registry of live request queues, keyed by queue name.
///
/// One registry is shared by every window of an application instance.
#[derive(Debug, Default)]
pub struct QueueRegistry {
    queues: Mutex<HashMap<String, QueueHandle>>,
}

impl QueueRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a queue by name. The returned handle may already be dead.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<QueueHandle> {
        self.lock().get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, QueueHandle>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, handle: &QueueHandle) -> Result<()> {
        let mut queues = self.lock();

        if let Some(existing) = queues.get(handle.name()) {
            if existing.is_alive() {
                return Err(Error::QueueExists(handle.name().to_string()));
            }
            warn!("Replacing dead request queue {}", handle.name());
        }

        queues.insert(handle.name().to_string(), handle.clone());
        Ok(())
    }

    fn unregister(&self, handle: &QueueHandle) {
        let mut queues = self.lock();

        if queues
            .get(handle.name())
            .is_some_and(|existing| existing.same_queue(handle))
        {
            queues.remove(handle.name());
        }
    }
}

/// Receiving side of a named request queue.
pub struct InvocationQueue {
    handle: QueueHandle,
    receiver: mpsc::UnboundedReceiver<InvocationRequest>,
    registry: Arc<QueueRegistry>,
    on_close: Option<InvocationRequest>,
    closed: bool,
}

impl std::fmt::Debug for InvocationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationQueue")
            .field("name", &self.handle.name())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl InvocationQueue {
    /// Create and register a queue.
    ///
    /// `on_close` is delivered to this queue's own receiver when the queue is
    /// closed, so the owner processes its shutdown like any other request.
    /// `keep_alive` of `None` disables the keep-alive check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueExists`] if a live queue with the same name is registered.
    pub fn open(
        registry: &Arc<QueueRegistry>,
        name: impl Into<String>,
        on_close: Option<InvocationRequest>,
        keep_alive: Option<Duration>,
    ) -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = QueueHandle {
            shared: Arc::new(QueueShared {
                name: name.into(),
                sender,
                closed: AtomicBool::new(false),
                last_keep_alive: Mutex::new(Instant::now()),
                keep_alive,
            }),
        };

        registry.register(&handle)?;
        debug!("Opened request queue {}", handle.name());

        Ok(Self {
            handle,
            receiver,
            registry: Arc::clone(registry),
            on_close,
            closed: false,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// A sending handle for this queue.
    #[must_use]
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    pub fn touch(&self) {
        self.handle.touch();
    }

    /// True until the queue is closed. Closes the queue if its keep-alive lapsed.
    pub fn is_alive(&mut self) -> bool {
        if self.closed {
            return false;
        }

        if !self.handle.is_alive() {
            self.close();
            return false;
        }

        true
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Next pending request without waiting.
    pub fn try_next(&mut self) -> Option<InvocationRequest> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next request. Returns `None` once the queue is closed and drained.
    pub async fn next(&mut self) -> Option<InvocationRequest> {
        if self.closed {
            return self.try_next();
        }

        self.receiver.recv().await
    }

    /// Close the queue. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.closed = true;
        self.handle.shared.closed.store(true, Ordering::Release);
        self.registry.unregister(&self.handle);
        debug!("Closed request queue {}", self.handle.name());

        if let Some(on_close) = self.on_close.take() {
            let _ = self.handle.shared.sender.send(on_close);
        }
    }
}

impl Drop for InvocationQueue {
    fn drop(&mut self) {
        self.handle.shared.closed.store(true, Ordering::Release);
        self.registry.unregister(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<QueueRegistry> {
        Arc::new(QueueRegistry::new())
    }

    #[test]
    fn test_window_name() {
        assert_eq!(window_name("p1"), "helpp1");
    }

    #[test]
    fn test_open_registers_and_delivers() {
        let registry = registry();
        let mut queue = InvocationQueue::open(&registry, "help1", None, None).unwrap();

        let handle = registry.get("help1").unwrap();
        assert!(handle.is_alive());
        handle.send_request(InvocationRequest::no_args("show")).unwrap();

        assert_eq!(queue.try_next().unwrap().method_name, "show");
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_duplicate_live_name_rejected() {
        let registry = registry();
        let _queue = InvocationQueue::open(&registry, "help1", None, None).unwrap();

        assert!(matches!(
            InvocationQueue::open(&registry, "help1", None, None),
            Err(Error::QueueExists(name)) if name == "help1"
        ));
    }

    #[test]
    fn test_close_unregisters_and_delivers_on_close() {
        let registry = registry();
        let mut queue =
            InvocationQueue::open(&registry, "help1", Some(InvocationRequest::close()), None)
                .unwrap();
        let handle = queue.handle();

        queue.close();
        queue.close();

        assert!(registry.get("help1").is_none());
        assert!(!handle.is_alive());
        assert!(matches!(
            handle.send_request(InvocationRequest::no_args("show")),
            Err(Error::QueueClosed(_))
        ));
        assert_eq!(queue.try_next(), Some(InvocationRequest::close()));
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_drop_marks_handle_dead() {
        let registry = registry();
        let queue = InvocationQueue::open(&registry, "help1", None, None).unwrap();
        let handle = queue.handle();
        drop(queue);

        assert!(!handle.is_alive());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_keep_alive_expiry() {
        let registry = registry();
        let mut queue = InvocationQueue::open(
            &registry,
            "help1",
            Some(InvocationRequest::close()),
            Some(Duration::ZERO),
        )
        .unwrap();
        let handle = queue.handle();

        std::thread::sleep(Duration::from_millis(5));
        assert!(!handle.is_alive());
        assert!(!queue.is_alive());
        assert!(queue.is_closed());
        assert_eq!(queue.try_next(), Some(InvocationRequest::close()));
    }

    #[test]
    fn test_touch_keeps_queue_alive() {
        let registry = registry();
        let queue =
            InvocationQueue::open(&registry, "help1", None, Some(Duration::from_secs(60)))
                .unwrap();
        queue.touch();
        assert!(queue.handle().is_alive());
    }

    #[test]
    fn test_dead_queue_name_can_be_reused() {
        let registry = registry();
        let mut first = InvocationQueue::open(&registry, "help1", None, Some(Duration::ZERO))
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));

        let second = InvocationQueue::open(&registry, "help1", None, None).unwrap();
        assert!(registry.get("help1").unwrap().same_queue(&second.handle()));

        // closing the stale queue must not unregister its replacement
        first.close();
        assert!(registry.get("help1").is_some());
    }

    #[tokio::test]
    async fn test_async_next() {
        let registry = registry();
        let mut queue = InvocationQueue::open(&registry, "help1", None, None).unwrap();
        let handle = queue.handle();

        tokio::spawn(async move {
            handle
                .send_command(&ViewerCommand::Show)
                .expect("queue is open");
        });

        let request = queue.next().await.unwrap();
        assert_eq!(request.method_name, "show");

        queue.close();
        assert!(queue.next().await.is_none());
    }
}
