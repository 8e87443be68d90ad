//! Fiber creation, switching and destruction.
//!
//! A fiber is a body entry running on its own OS thread and stack. The
//! driver and the body never run at the same time: control moves as a baton
//! over two zero-capacity channels, so every send blocks until the other side
//! is ready to receive and the sender then parks on its own receive.
//!
//! ```text
//!   driver                         body thread
//!   ------                         -----------
//!   switch_in  -- Signal::Resume -->  (runs)
//!   (parked)   <-- Report::Suspended  switch_out
//!   switch_in  -- Signal::Resume -->  (runs)
//!   (parked)   <-- Report::Exited     entry returns
//! ```
//!
//! Destroying a parked fiber sends `Signal::Unwind`: the pending
//! `switch_out` fails and the body is expected to return. A body that
//! switches out again instead reports `Report::Refused` and parks for good;
//! the driver then detaches its thread rather than waiting on it.

use std::any::Any;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, trace, warn};

use crate::config::FiberConfig;
use crate::error::{FiberError, FiberResult, Unwinding};

/// Driver to body.
#[derive(Debug)]
enum Signal {
    Resume,
    Unwind,
}

/// Body to driver.
#[derive(Debug)]
enum Report {
    Suspended,
    Exited,
    Panicked(String),
    Refused,
}

/// Outcome of handing control to a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// The body called `switch_out` and is parked
    Suspended,
    /// The body entry returned; the thread has been joined
    Exited,
}

/// Lifecycle of a fiber as seen from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberState {
    /// Spawned; the entry has not been entered yet
    Created,
    /// Parked inside `switch_out`
    Suspended,
    /// Entry returned, panicked or was unwound; thread joined
    Exited,
    /// Body kept switching out after being told to unwind; thread detached
    Abandoned,
}

/// Body-side half of a fiber, handed to the entry function.
pub struct Suspender {
    signals: Receiver<Signal>,
    reports: Sender<Report>,
    unwinding: Cell<bool>,
}

impl Suspender {
    /// Hands control back to the driver and parks until resumed.
    ///
    /// Returns `Err(Unwinding)` if the driver destroys the fiber instead of
    /// resuming it. Switching out again after that tells the driver the body
    /// refuses to unwind, and the calling thread parks forever.
    pub fn switch_out(&self) -> Result<(), Unwinding> {
        if self.unwinding.get() {
            warn!(
                "fiber {:?} switched out while unwinding; parking it",
                thread::current().name()
            );
            let _ = self.reports.send(Report::Refused);
            loop {
                thread::park();
            }
        }
        trace!("fiber {:?} switching out", thread::current().name());
        if self.reports.send(Report::Suspended).is_err() {
            self.unwinding.set(true);
            return Err(Unwinding);
        }
        match self.signals.recv() {
            Ok(Signal::Resume) => Ok(()),
            Ok(Signal::Unwind) | Err(_) => {
                self.unwinding.set(true);
                Err(Unwinding)
            }
        }
    }

    /// True once the fiber has been told to unwind.
    pub fn is_unwinding(&self) -> bool {
        self.unwinding.get()
    }
}

/// Driver-side half of a fiber.
pub struct Fiber {
    name: String,
    state: FiberState,
    signals: Sender<Signal>,
    reports: Receiver<Report>,
    thread: Option<JoinHandle<()>>,
}

impl Fiber {
    /// Creates a fiber that will run `entry` on its own stack.
    ///
    /// The entry does not start until the first [`Fiber::switch_in`].
    pub fn spawn<F>(config: &FiberConfig, name: &str, entry: F) -> FiberResult<Self>
    where
        F: FnOnce(&Suspender) + Send + 'static,
    {
        let (signal_tx, signal_rx) = channel::bounded::<Signal>(0);
        let (report_tx, report_rx) = channel::bounded::<Report>(0);

        let handle = thread::Builder::new()
            .name(config.thread_name(name))
            .stack_size(config.stack_size)
            .spawn(move || {
                let suspender = Suspender {
                    signals: signal_rx,
                    reports: report_tx,
                    unwinding: Cell::new(false),
                };

                // Destroyed before ever being entered
                match suspender.signals.recv() {
                    Ok(Signal::Resume) => {}
                    Ok(Signal::Unwind) | Err(_) => return,
                }

                let report = match panic::catch_unwind(AssertUnwindSafe(|| entry(&suspender))) {
                    Ok(()) => Report::Exited,
                    Err(payload) => Report::Panicked(panic_message(payload.as_ref())),
                };
                let _ = suspender.reports.send(report);
            })
            .map_err(FiberError::Spawn)?;

        debug!("spawned fiber '{}' ({} byte stack)", name, config.stack_size);

        Ok(Fiber {
            name: name.to_string(),
            state: FiberState::Created,
            signals: signal_tx,
            reports: report_rx,
            thread: Some(handle),
        })
    }

    /// Name the fiber was spawned with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FiberState {
        self.state
    }

    /// True once the entry can no longer run.
    pub fn is_exited(&self) -> bool {
        matches!(self.state, FiberState::Exited | FiberState::Abandoned)
    }

    /// Transfers control into the fiber and blocks until it switches out or
    /// its entry returns.
    pub fn switch_in(&mut self) -> FiberResult<Transfer> {
        if self.is_exited() {
            return Err(FiberError::Exited);
        }
        trace!("switching into fiber '{}'", self.name);

        if self.signals.send(Signal::Resume).is_err() {
            self.finish();
            return Err(FiberError::Disconnected);
        }

        match self.reports.recv() {
            Ok(Report::Suspended) => {
                self.state = FiberState::Suspended;
                Ok(Transfer::Suspended)
            }
            Ok(Report::Exited) => {
                self.finish();
                Ok(Transfer::Exited)
            }
            Ok(Report::Panicked(message)) => {
                self.finish();
                Err(FiberError::Panicked(message))
            }
            Ok(Report::Refused) => {
                self.detach();
                Err(FiberError::Disconnected)
            }
            Err(_) => {
                self.finish();
                Err(FiberError::Disconnected)
            }
        }
    }

    /// Tears the fiber down.
    ///
    /// A parked body observes [`Unwinding`] from its pending `switch_out` and
    /// runs to the end of its entry; the thread is joined before returning.
    /// A fiber that was never entered exits without running its entry.
    ///
    /// If the body switches out again instead of returning, its thread is
    /// detached and left parked, and the fiber ends up
    /// [`FiberState::Abandoned`].
    pub fn destroy(&mut self) {
        if self.is_exited() {
            return;
        }
        debug!("destroying fiber '{}' in state {:?}", self.name, self.state);

        if self.signals.send(Signal::Unwind).is_ok() {
            // Drain until the entry reports its exit or drops the channel
            loop {
                match self.reports.recv() {
                    Ok(Report::Suspended) => continue,
                    Ok(Report::Exited) | Err(_) => break,
                    Ok(Report::Panicked(message)) => {
                        warn!("fiber '{}' panicked while unwinding: {}", self.name, message);
                        break;
                    }
                    Ok(Report::Refused) => {
                        warn!("fiber '{}' refused to unwind; detaching its thread", self.name);
                        self.detach();
                        return;
                    }
                }
            }
        }
        self.finish();
    }

    fn detach(&mut self) {
        self.state = FiberState::Abandoned;
        drop(self.thread.take());
    }

    fn finish(&mut self) {
        self.state = FiberState::Exited;
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("fiber '{}' thread terminated abnormally", self.name);
            }
            debug!("fiber '{}' exited", self.name);
        }
    }
}

impl Drop for Fiber {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Fiber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

/// Printable message of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
