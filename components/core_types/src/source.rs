//! Stack frame records for error traces.
//!
//! This module provides the records an error payload carries as it crosses
//! frames on its way out of a generator body.

use std::fmt;

/// A single entry of an error trace.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("numbers".to_string()),
///     source_url: Some("main.py".to_string()),
///     line: 25,
///     column: 0,
/// };
///
/// assert_eq!(frame.to_string(), "  File \"main.py\", line 25, in numbers");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or None for module-level code
    pub function_name: Option<String>,
    /// File path of the source, or None if not available
    pub source_url: Option<String>,
    /// Line being executed when the frame was captured
    pub line: u32,
    /// Column being executed when the frame was captured
    pub column: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  File \"{}\", line {}, in {}",
            self.source_url.as_deref().unwrap_or("<unknown>"),
            self.line,
            self.function_name.as_deref().unwrap_or("<module>")
        )
    }
}
