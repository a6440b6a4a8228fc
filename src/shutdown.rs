//! Cooperative shutdown.
//!
//! A [`ShutdownToken`] is an atomic flag plus a condvar.  The sampling loop
//! sleeps in [`ShutdownToken::wait_until`], which returns as soon as a
//! shutdown is requested from any thread (normally the signal thread).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The deadline passed.
    Elapsed,
    /// Shutdown was requested before the deadline.
    Cancelled,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Cloneable handle; every clone observes the same request.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter.  Idempotent.
    pub fn request(&self) {
        // Store under the lock so a waiter between its flag check and its
        // condvar wait cannot miss the notification.
        let _guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.wake.notify_all();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Sleep until `deadline`, in slices of at most `slice`.
    pub fn wait_until(&self, deadline: Instant, slice: Duration) -> WaitOutcome {
        let mut guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.is_requested() {
                return WaitOutcome::Cancelled;
            }
            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            let timeout = (deadline - now).min(slice);
            guard = match self.inner.wake.wait_timeout(guard, timeout) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

/// Request shutdown on SIGINT or SIGTERM.
///
/// The handler runs on a dedicated thread owned by `signal-hook`.
pub fn install_signal_handlers(token: &ShutdownToken) -> std::io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let token = token.clone();
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Signal {} received, shutting down", sig);
                token.request();
            } else {
                warn!("Signal iterator closed");
            }
        })?;
    Ok(())
}
