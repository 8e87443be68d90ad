//! Frames linking running code to the current-frame stack

use core_types::StackFrame;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::code::CodeMetadata;

/// Frame of a body that can be suspended and resumed.
///
/// A generator owns exactly one frame for its whole life. The frame is only
/// marked executing while it sits on a thread's current-frame stack, so a
/// diagnostic taken while the body is suspended sees it as inactive.
#[derive(Debug)]
pub struct Frame {
    code: Arc<CodeMetadata>,
    line: AtomicU32,
    executing: AtomicBool,
}

impl Frame {
    /// Create a frame positioned at the first line of `code`
    pub fn new(code: Arc<CodeMetadata>) -> Self {
        let line = code.first_line();
        Self {
            code,
            line: AtomicU32::new(line),
            executing: AtomicBool::new(false),
        }
    }

    /// Code the frame runs
    pub fn code(&self) -> &Arc<CodeMetadata> {
        &self.code
    }

    /// Line most recently reported by the body
    pub fn line(&self) -> u32 {
        self.line.load(Ordering::Acquire)
    }

    /// Record the line the body is executing
    pub fn set_line(&self, line: u32) {
        self.line.store(line, Ordering::Release);
    }

    /// True while the frame is on a current-frame stack
    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::Acquire)
    }

    pub(crate) fn set_executing(&self, executing: bool) {
        self.executing.store(executing, Ordering::Release);
    }

    /// Trace record for the frame's current position
    pub fn snapshot(&self) -> StackFrame {
        StackFrame {
            function_name: Some(self.code.name().to_string()),
            source_url: Some(self.code.filename().to_string()),
            line: self.line(),
            column: 0,
        }
    }
}
