//! # Process Lifecycle Hooks
//!
//! The host process announces its lifecycle through a [`LifecycleNotifier`]:
//! callbacks are registered per [`LifecycleEvent`] and invoked by the host at
//! the matching transition, in registration order.
//!
//! [`LifecycleRegistry`] is a ready-made in-memory notifier. Hosts that already
//! have hook lists can implement the traits over them instead.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Process lifecycle transitions the publisher reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Process finished booting and starts processing jobs
    Startup,
    /// Process stops fetching new jobs and drains
    Quiet,
    /// Process is about to exit
    Shutdown,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 3] = [
        LifecycleEvent::Startup,
        LifecycleEvent::Quiet,
        LifecycleEvent::Shutdown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Startup => "startup",
            LifecycleEvent::Quiet => "quiet",
            LifecycleEvent::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback invoked when a lifecycle event fires
pub type LifecycleHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`LifecycleHook`]
pub fn hook<F, Fut>(f: F) -> LifecycleHook
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Accepts hook registrations for lifecycle events
pub trait LifecycleNotifier: Send + Sync {
    fn on(&self, event: LifecycleEvent, hook: LifecycleHook);
}

/// The process the publisher is embedded in
pub trait ProcessHost: LifecycleNotifier {
    /// `true` for a job-processing server, `false` for client-only processes
    fn is_server(&self) -> bool;

    /// Record that metrics publishing was activated for this process.
    ///
    /// Returns `true` only for the first claim; every later claim returns `false`.
    fn claim_activation(&self) -> bool;
}

/// In-memory hook lists keyed by event
#[derive(Default)]
pub struct LifecycleRegistry {
    server: bool,
    activated: AtomicBool,
    hooks: Mutex<HashMap<LifecycleEvent, Vec<LifecycleHook>>>,
}

impl fmt::Debug for LifecycleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.lock();
        let counts: HashMap<&str, usize> = hooks
            .iter()
            .map(|(event, list)| (event.name(), list.len()))
            .collect();
        f.debug_struct("LifecycleRegistry")
            .field("server", &self.server)
            .field("activated", &self.activated.load(Ordering::SeqCst))
            .field("hooks", &counts)
            .finish()
    }
}

impl LifecycleRegistry {
    pub fn new(server: bool) -> Self {
        Self {
            server,
            activated: AtomicBool::new(false),
            hooks: Mutex::new(HashMap::new()),
        }
    }

    /// Registry for a job-processing server process
    pub fn server() -> Self {
        Self::new(true)
    }

    /// Registry for a client-only process
    pub fn client() -> Self {
        Self::new(false)
    }

    pub fn hook_count(&self, event: LifecycleEvent) -> usize {
        self.hooks.lock().get(&event).map_or(0, Vec::len)
    }

    /// Run every hook registered for `event`, one after another
    pub async fn fire(&self, event: LifecycleEvent) {
        let hooks: Vec<LifecycleHook> =
            self.hooks.lock().get(&event).cloned().unwrap_or_default();

        debug!(event = %event, hook_count = hooks.len(), "Firing lifecycle event");

        for hook in hooks {
            hook().await;
        }
    }

    /// Drop every registered hook
    pub fn clear(&self) {
        self.hooks.lock().clear();
    }
}

impl LifecycleNotifier for LifecycleRegistry {
    fn on(&self, event: LifecycleEvent, hook: LifecycleHook) {
        self.hooks.lock().entry(event).or_default().push(hook);
    }
}

impl ProcessHost for LifecycleRegistry {
    fn is_server(&self) -> bool {
        self.server
    }

    fn claim_activation(&self) -> bool {
        !self.activated.swap(true, Ordering::SeqCst)
    }
}
