//! Cancellable pump turn-off timer.
//!
//! Each activation spawns one short-lived thread that sleeps for the run
//! duration on a child of the loop's shutdown signal, then switches the
//! pump off and records it.  A three-state phase word decides the race
//! between the timer firing and the loop cancelling it, so the pump is
//! commanded off exactly once per activation.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info, warn};

use crate::app::ports::ActuatorPort;
use crate::drivers::task::{self, PUMP_TIMER_TASK};
use crate::shutdown::ShutdownSignal;
use crate::store::StateStore;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

struct Pending {
    cancel: ShutdownSignal,
    phase: Arc<AtomicU8>,
    handle: JoinHandle<()>,
}

impl Pending {
    fn join(self) {
        if self.handle.join().is_err() {
            warn!("pump timer thread panicked");
        }
    }
}

/// At most one outstanding turn-off per timer.
pub struct PumpTimer<R: ActuatorPort + 'static> {
    relays: Arc<Mutex<R>>,
    state: Arc<StateStore>,
    shutdown: ShutdownSignal,
    pending: Option<Pending>,
}

impl<R: ActuatorPort + 'static> PumpTimer<R> {
    pub fn new(relays: Arc<Mutex<R>>, state: Arc<StateStore>, shutdown: ShutdownSignal) -> Self {
        Self {
            relays,
            state,
            shutdown,
            pending: None,
        }
    }

    /// Schedule the pump off after `duration`, replacing any pending
    /// turn-off.
    pub fn arm(&mut self, duration: Duration) -> io::Result<()> {
        self.cancel();

        let cancel = self.shutdown.child();
        let phase = Arc::new(AtomicU8::new(PENDING));
        let handle = {
            let cancel = cancel.clone();
            let phase = Arc::clone(&phase);
            let relays = Arc::clone(&self.relays);
            let state = Arc::clone(&self.state);
            task::spawn(PUMP_TIMER_TASK, move || {
                if cancel.sleep(duration) {
                    return;
                }
                if phase
                    .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    return;
                }
                let result = relays
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .set_pump(false);
                match result {
                    Ok(()) => info!("Pump run of {}s complete", duration.as_secs()),
                    Err(e) => error!("Pump turn-off failed: {e}"),
                }
                state.update_state(|s| s.pump_on = false);
            })?
        };

        self.pending = Some(Pending {
            cancel,
            phase,
            handle,
        });
        Ok(())
    }

    /// Cancel the pending turn-off, if any, and wait for its thread.
    ///
    /// Returns `true` only when this call stopped the timer before it
    /// fired; the caller then owns switching the pump off.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let prevented = pending
            .phase
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        pending.cancel.trigger();
        pending.join();
        prevented
    }

    /// Collect a timer that has already fired.  Returns `true` once per
    /// fired activation.
    pub fn reap(&mut self) -> bool {
        let fired = self
            .pending
            .as_ref()
            .is_some_and(|p| p.phase.load(Ordering::Acquire) == FIRED);
        if fired {
            if let Some(pending) = self.pending.take() {
                pending.join();
            }
        }
        fired
    }

    /// A turn-off is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| p.phase.load(Ordering::Acquire) == PENDING)
    }
}

impl<R: ActuatorPort + 'static> Drop for PumpTimer<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}
