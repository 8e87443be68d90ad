//! Cells shared between a generator's driver and its body.
//!
//! Each cell is written by one side just before a switch and taken by the
//! other side just after it, so a value is only ever visible between a
//! yield and the resume that follows it.

use std::sync::Arc;

use core_types::{ErrorPayload, Value};
use host_runtime::ThreadState;
use parking_lot::Mutex;

/// What a body entry produces when it stops for good.
pub type BodyResult = Result<Value, ErrorPayload>;

#[derive(Default)]
struct Cells {
    yielded: Option<Value>,
    sent: Option<Value>,
    error: Option<ErrorPayload>,
    returned: Option<BodyResult>,
    driver: Option<Arc<ThreadState>>,
}

#[derive(Default)]
pub(crate) struct Rendezvous {
    cells: Mutex<Cells>,
}

impl Rendezvous {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn put_yielded(&self, value: Value) {
        self.cells.lock().yielded = Some(value);
    }

    pub(crate) fn take_yielded(&self) -> Option<Value> {
        self.cells.lock().yielded.take()
    }

    pub(crate) fn put_sent(&self, value: Value) {
        self.cells.lock().sent = Some(value);
    }

    pub(crate) fn take_sent(&self) -> Option<Value> {
        self.cells.lock().sent.take()
    }

    pub(crate) fn inject_error(&self, error: ErrorPayload) {
        self.cells.lock().error = Some(error);
    }

    pub(crate) fn take_error(&self) -> Option<ErrorPayload> {
        self.cells.lock().error.take()
    }

    pub(crate) fn put_returned(&self, result: BodyResult) {
        self.cells.lock().returned = Some(result);
    }

    pub(crate) fn take_returned(&self) -> Option<BodyResult> {
        self.cells.lock().returned.take()
    }

    pub(crate) fn set_driver(&self, state: Arc<ThreadState>) {
        self.cells.lock().driver = Some(state);
    }

    pub(crate) fn driver(&self) -> Option<Arc<ThreadState>> {
        self.cells.lock().driver.clone()
    }

    /// Drop everything left behind by an interrupted exchange.
    pub(crate) fn clear(&self) {
        let mut cells = self.cells.lock();
        cells.yielded = None;
        cells.sent = None;
        cells.error = None;
        cells.returned = None;
    }
}
