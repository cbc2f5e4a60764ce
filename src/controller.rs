//! # Lifecycle Controller
//!
//! Wires the publisher into the host process lifecycle.
//!
//! ```text
//! Disabled --enable (server)--> Armed --startup--> Starting --> Running --quiet/shutdown--> Stopped
//! ```
//!
//! Activation is decided once per process: the first [`CloudWatchMetrics::enable`]
//! call claims the host, and any later call (on this controller or another
//! one) registers nothing. In a client-only process nothing is registered and
//! no publisher is ever built. The publisher itself is built when `startup`
//! fires; `quiet` stops the loop, `shutdown` also closes the sink. There is no
//! way back to `Running` within one process lifetime.
//!
//! `startup` and `quiet` / `shutdown` are serialized on the loop slot, so a
//! stop that arrives while the publisher is being built either waits for the
//! loop to exist and stops it, or makes the pending startup back off.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::MetricsConfig;
use crate::error::MetricsResult;
use crate::lifecycle::{hook, LifecycleEvent, ProcessHost};
use crate::logging::log_error;
use crate::publisher::Publisher;
use crate::scheduler::PublishLoop;
use crate::sink::MetricsSink;
use crate::stats::{QueueLatencyLookup, StatsProvider};

/// Builds the publisher when the process starts up
pub type PublisherFactory = Box<dyn Fn(&MetricsConfig) -> MetricsResult<Publisher> + Send + Sync>;

/// State of the metrics reporting for this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Not activated, or activated in a client-only process
    Disabled,
    /// Hooks registered, waiting for startup
    Armed,
    /// Startup fired, publisher and loop being built
    Starting,
    /// Publish loop active
    Running,
    /// Loop stopped by quiet or shutdown
    Stopped,
}

/// Entry point that activates metrics publishing for a process
#[derive(Clone)]
pub struct CloudWatchMetrics {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: MetricsConfig,
    factory: PublisherFactory,
    evaluated: AtomicBool,
    state: Mutex<ControllerState>,
    publisher: Mutex<Option<Arc<Publisher>>>,
    publish_loop: tokio::sync::Mutex<Option<PublishLoop>>,
}

impl fmt::Debug for CloudWatchMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudWatchMetrics")
            .field("namespace", &self.inner.config.namespace)
            .field("state", &self.state())
            .finish()
    }
}

impl CloudWatchMetrics {
    /// Controller building its publisher with `factory`; `config` is validated now
    pub fn new<F>(config: MetricsConfig, factory: F) -> MetricsResult<Self>
    where
        F: Fn(&MetricsConfig) -> MetricsResult<Publisher> + Send + Sync + 'static,
    {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                factory: Box::new(factory),
                evaluated: AtomicBool::new(false),
                state: Mutex::new(ControllerState::Disabled),
                publisher: Mutex::new(None),
                publish_loop: tokio::sync::Mutex::new(None),
            }),
        })
    }

    /// Controller whose publisher uses the given collaborators
    pub fn with_collaborators(
        config: MetricsConfig,
        sink: Arc<dyn MetricsSink>,
        stats: Arc<dyn StatsProvider>,
        latency: Arc<dyn QueueLatencyLookup>,
    ) -> MetricsResult<Self> {
        Self::new(config, move |config| {
            Publisher::new(
                config.clone(),
                Arc::clone(&sink),
                Arc::clone(&stats),
                Arc::clone(&latency),
            )
        })
    }

    /// Register lifecycle hooks when `host` is a server process.
    ///
    /// Only the first call has any effect; later calls return the current state.
    pub fn enable(&self, host: &dyn ProcessHost) -> ControllerState {
        if self.inner.evaluated.swap(true, Ordering::SeqCst) {
            debug!("Metrics activation already evaluated, ignoring repeated enable");
            return self.state();
        }

        if !host.is_server() {
            info!("Not a server process, metrics publishing stays disabled");
            return ControllerState::Disabled;
        }

        if !host.claim_activation() {
            warn!("Metrics publishing already activated for this process, ignoring enable");
            return ControllerState::Disabled;
        }

        let inner = Arc::clone(&self.inner);
        host.on(
            LifecycleEvent::Startup,
            hook(move || {
                let inner = Arc::clone(&inner);
                async move { inner.start().await }
            }),
        );

        let inner = Arc::clone(&self.inner);
        host.on(
            LifecycleEvent::Quiet,
            hook(move || {
                let inner = Arc::clone(&inner);
                async move { inner.stop(LifecycleEvent::Quiet).await }
            }),
        );

        let inner = Arc::clone(&self.inner);
        host.on(
            LifecycleEvent::Shutdown,
            hook(move || {
                let inner = Arc::clone(&inner);
                async move { inner.stop(LifecycleEvent::Shutdown).await }
            }),
        );

        *self.inner.state.lock() = ControllerState::Armed;
        info!(
            namespace = %self.inner.config.namespace,
            interval_seconds = self.inner.config.interval_seconds,
            "Metrics publishing armed"
        );

        ControllerState::Armed
    }

    pub fn state(&self) -> ControllerState {
        *self.inner.state.lock()
    }

    /// The publisher built at startup, if any
    pub fn publisher(&self) -> Option<Arc<Publisher>> {
        self.inner.publisher.lock().clone()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.inner.config
    }
}

impl ControllerInner {
    async fn start(&self) {
        {
            let mut state = self.state.lock();
            if *state != ControllerState::Armed {
                warn!(state = ?*state, "Ignoring startup, metrics publishing is not armed");
                return;
            }
            *state = ControllerState::Starting;
        }

        // Held until the loop is stored, so a concurrent stop waits for it
        let mut slot = self.publish_loop.lock().await;

        let still_starting = *self.state.lock() == ControllerState::Starting;
        if !still_starting {
            info!("Metrics publishing stopped before startup completed");
            return;
        }

        let publisher = match (self.factory)(&self.config) {
            Ok(publisher) => Arc::new(publisher),
            Err(e) => {
                log_error(
                    "metrics_controller",
                    "startup",
                    &e.to_string(),
                    Some("publisher construction failed; metrics publishing disabled"),
                );
                *self.state.lock() = ControllerState::Stopped;
                return;
            }
        };

        let mut publish_loop = PublishLoop::with_timing(
            Arc::clone(&publisher),
            self.config.interval(),
            self.config.shutdown_timeout(),
        );
        publish_loop.start();

        *slot = Some(publish_loop);
        *self.publisher.lock() = Some(publisher);
        *self.state.lock() = ControllerState::Running;
    }

    async fn stop(&self, event: LifecycleEvent) {
        info!(event = %event, "Stopping metrics publishing");

        let mut slot = self.publish_loop.lock().await;

        {
            let mut state = self.state.lock();
            if *state != ControllerState::Disabled {
                *state = ControllerState::Stopped;
            }
        }

        if let Some(mut publish_loop) = slot.take() {
            if let Err(e) = publish_loop.stop().await {
                log_error("metrics_controller", event.name(), &e.to_string(), None);
            }
        }

        if event == LifecycleEvent::Shutdown {
            let publisher = self.publisher.lock().take();
            if let Some(publisher) = publisher {
                if let Err(e) = publisher.close().await {
                    log_error("metrics_controller", "close_sink", &e.to_string(), None);
                }
            }
        }
    }
}
