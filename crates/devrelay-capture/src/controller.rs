//! Capture controller - process-wide failure interception
//!
//! Owns the `Uninitialized → Active → ShutDown` lifecycle, the chaining
//! panic hook, and the primary-thread liveness watchdog. On every captured
//! failure it runs the pipeline: trail snapshot → fingerprint → report →
//! reporter dispatch.
//!
//! ## Lifecycle
//!
//! `ShutDown` is terminal: a controller that has been shut down rejects
//! re-initialization, because the installed panic-hook chain cannot be
//! re-installed safely. A second `initialize` on an active controller logs
//! a warning and is a no-op (the hook is not chained twice).
//!
//! ## Liveness
//!
//! `std::thread::Thread` exposes no `is_alive`, so the initializing thread
//! parks an `Arc<()>` guard in one of its thread-locals. TLS destructors
//! drop the guard when the thread exits; the watchdog polls the matching
//! `Weak` and synthesizes a crash report when the upgrade fails without an
//! observed panic.

use std::{
    cell::{Cell, RefCell},
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, RwLock, Weak,
    },
    time::Duration,
};

use devrelay_core::{
    domain::{Issue, RelayError, Severity},
    ports::IssueReporter,
    RelayConfig,
};
use tracing::{debug, error, info, warn};

use crate::{
    failure::{self, FailureEvent},
    fingerprint::fingerprint,
    report::format_report,
    trail::BreadcrumbTrail,
};

const STATE_UNINITIALIZED: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_SHUT_DOWN: u8 = 2;

thread_local! {
    /// Liveness guard parked in the primary thread's TLS by `initialize`.
    static LIVENESS_GUARD: RefCell<Option<Arc<()>>> = const { RefCell::new(None) };

    /// Re-entrancy latch: a panic raised while we are already inside the
    /// hook (e.g. from a buggy reporter) must not be handled again, only
    /// forwarded, or the hook would recurse until the stack overflows.
    static IN_PANIC_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Orchestrates failure capture for one telemetry context.
///
/// Cheap to clone (shared `Arc` state); the host owns exactly one.
#[derive(Clone)]
pub struct CaptureController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    state: AtomicU8,
    config: RelayConfig,
    trail: Arc<BreadcrumbTrail>,
    reporter: RwLock<Arc<dyn IssueReporter>>,
    /// Set by the panic-hook path; read by the watchdog to avoid double
    /// reporting when a panic took the primary thread down.
    crash_observed: AtomicBool,
    /// Ensures the watchdog synthesizes at most one thread-death report.
    watchdog_fired: AtomicBool,
    primary: Mutex<Option<PrimaryThread>>,
    watchdog: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

struct PrimaryThread {
    name: String,
    liveness: Weak<()>,
}

impl CaptureController {
    /// Creates an uninitialized controller.
    pub fn new(
        config: RelayConfig,
        trail: Arc<BreadcrumbTrail>,
        reporter: Arc<dyn IssueReporter>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: AtomicU8::new(STATE_UNINITIALIZED),
                config,
                trail,
                reporter: RwLock::new(reporter),
                crash_observed: AtomicBool::new(false),
                watchdog_fired: AtomicBool::new(false),
                primary: Mutex::new(None),
                watchdog: Mutex::new(None),
            }),
        }
    }

    /// One-time transition to `Active`.
    ///
    /// Must be called from the host's primary thread: that thread is the
    /// one the watchdog guards. Validates the configuration, chains the
    /// panic hook, and starts the watchdog on `runtime`.
    pub fn initialize(&self, runtime: &tokio::runtime::Handle) -> Result<(), RelayError> {
        self.inner.config.validate()?;

        match self.inner.state.compare_exchange(
            STATE_UNINITIALIZED,
            STATE_ACTIVE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {}
            Err(STATE_ACTIVE) => {
                warn!("DevRelay already initialized, ignoring repeated initialize call");
                return Err(RelayError::AlreadyInitialized);
            }
            Err(_) => return Err(RelayError::ShutDown),
        }

        self.register_primary_thread();
        self.install_panic_hook();
        self.start_watchdog(runtime);

        info!(app_id = %self.inner.config.app_id, "DevRelay capture controller active");
        Ok(())
    }

    /// Records the calling thread as the guarded primary thread.
    fn register_primary_thread(&self) {
        let guard = Arc::new(());
        let liveness = Arc::downgrade(&guard);
        LIVENESS_GUARD.with(|slot| *slot.borrow_mut() = Some(guard));

        let name = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        debug!(thread = %name, "Registered primary thread");

        *lock_ignore_poison(&self.inner.primary) = Some(PrimaryThread { name, liveness });
    }

    /// Chains onto - never replaces - any previously installed panic hook.
    ///
    /// Our handling runs first, guarded so nothing we do can prevent the
    /// forward; the previous hook runs last, outside the guard, so host
    /// diagnostics behave exactly as they would without DevRelay.
    fn install_panic_hook(&self) {
        let previous = std::panic::take_hook();
        let weak = Arc::downgrade(&self.inner);

        std::panic::set_hook(Box::new(move |panic_info| {
            let re_entered = IN_PANIC_HOOK.with(|flag| flag.replace(true));
            if !re_entered {
                if let Some(inner) = weak.upgrade() {
                    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        inner.handle_panic(panic_info);
                    }));
                    if outcome.is_err() {
                        // Never let our own failure suppress the chained hook
                        eprintln!("devrelay: internal error while handling a panic");
                    }
                }
                IN_PANIC_HOOK.with(|flag| flag.set(false));
            }
            previous(panic_info);
        }));
    }

    fn start_watchdog(&self, runtime: &tokio::runtime::Handle) {
        let inner = Arc::clone(&self.inner);
        let interval = Duration::from_secs(self.inner.config.watchdog_interval_secs.max(1));

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would race initialize itself
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if inner.state.load(Ordering::Acquire) != STATE_ACTIVE {
                    break;
                }
                if inner.primary_thread_dead() {
                    inner.report_thread_death();
                    break;
                }
            }
        });

        *lock_ignore_poison(&self.inner.watchdog) = Some(handle);
    }

    /// Captures a failure at the given severity and dispatches it through
    /// the reporter seam. Returns `true` when the failure was processed.
    ///
    /// Never panics and never blocks on the network; internal errors are
    /// logged and swallowed.
    pub fn capture(&self, event: FailureEvent, severity: Severity) -> bool {
        self.inner.capture(event, severity)
    }

    /// Replaces the reporter behind the dispatch seam.
    pub fn set_reporter(&self, reporter: Arc<dyn IssueReporter>) {
        match self.inner.reporter.write() {
            Ok(mut slot) => *slot = reporter,
            Err(poisoned) => *poisoned.into_inner() = reporter,
        }
    }

    /// Transitions to the terminal `ShutDown` state.
    ///
    /// Stops accepting captures and aborts the watchdog. In-flight
    /// deliveries are neither awaited nor cancelled here; the delivery
    /// subsystem releases its own resources.
    pub fn shutdown(&self) {
        let before = self.inner.state.swap(STATE_SHUT_DOWN, Ordering::AcqRel);
        if before == STATE_SHUT_DOWN {
            return;
        }
        if let Some(watchdog) = lock_ignore_poison(&self.inner.watchdog).take() {
            watchdog.abort();
        }
        info!("DevRelay capture controller shut down");
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == STATE_ACTIVE
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == STATE_SHUT_DOWN
    }
}

impl ControllerInner {
    fn handle_panic(&self, panic_info: &std::panic::PanicHookInfo<'_>) {
        if self.state.load(Ordering::Acquire) != STATE_ACTIVE {
            return;
        }
        self.crash_observed.store(true, Ordering::Release);

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

        let frames = failure::capture_frames();
        let event = FailureEvent::from_panic(message, location, frames);

        self.capture(event, Severity::Crash);
    }

    fn capture(&self, event: FailureEvent, severity: Severity) -> bool {
        if self.state.load(Ordering::Acquire) != STATE_ACTIVE {
            warn!(
                class = %event.exception_class,
                "DevRelay not active, failure not tracked"
            );
            return false;
        }

        // Failure handling must never itself fail the host.
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.capture_pipeline(event, severity);
        }));
        match outcome {
            Ok(()) => true,
            Err(_) => {
                error!("Internal error while processing a captured failure");
                false
            }
        }
    }

    fn capture_pipeline(&self, event: FailureEvent, severity: Severity) {
        let fp = fingerprint(
            &event.exception_class,
            &event.frames,
            event.message.as_deref(),
        );

        let issue = Issue {
            severity,
            timestamp: chrono::Utc::now(),
            origin_thread: std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string(),
            exception_class: event.exception_class,
            message: event.message,
            frames: event.frames,
            fingerprint: fp,
        };

        let breadcrumbs = self.trail.snapshot();
        let report = format_report(&issue, &breadcrumbs);
        debug!(
            fingerprint = %issue.fingerprint,
            severity = %issue.severity,
            "Dispatching captured issue"
        );

        let reporter = match self.reporter.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        };
        // The same snapshot the report was formatted from travels to the
        // reporter, so payload and report text can never disagree.
        if severity == Severity::Crash {
            reporter.report_crash(&report, &issue, &breadcrumbs);
        } else {
            reporter.report_error(&report, &issue, &breadcrumbs);
        }
    }

    fn primary_thread_dead(&self) -> bool {
        let primary = lock_ignore_poison(&self.primary);
        match primary.as_ref() {
            Some(p) => p.liveness.upgrade().is_none(),
            None => false,
        }
    }

    /// Synthesizes the thread-death crash the panic-hook path cannot see.
    fn report_thread_death(&self) {
        if self.crash_observed.load(Ordering::Acquire) {
            // The panic hook already reported the failure that killed it
            return;
        }
        if self.watchdog_fired.swap(true, Ordering::AcqRel) {
            return;
        }

        let name = lock_ignore_poison(&self.primary)
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        error!(thread = %name, "Primary thread died without an observed failure");

        let event = FailureEvent {
            exception_class: "ThreadDeath".to_string(),
            message: Some(format!("Primary thread '{name}' died unexpectedly")),
            frames: Vec::new(),
        };
        self.capture(event, Severity::Crash);
    }
}

fn lock_ignore_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
