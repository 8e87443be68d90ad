//! Fiber configuration.

/// Default stack size for a body fiber.
pub const DEFAULT_STACK_SIZE: usize = 512 * 1024;

/// Default prefix for fiber thread names.
pub const DEFAULT_NAME_PREFIX: &str = "fiber-";

/// Configuration for spawning fibers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiberConfig {
    /// Size in bytes of the stack each body fiber runs on
    pub stack_size: usize,
    /// Prefix prepended to the fiber name to form its thread name
    pub name_prefix: String,
}

impl FiberConfig {
    /// Sets the stack size.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Sets the thread name prefix.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Thread name for a fiber called `name`.
    ///
    /// NUL bytes are dropped; the OS cannot carry them in a thread name.
    pub(crate) fn thread_name(&self, name: &str) -> String {
        self.name_prefix
            .chars()
            .chain(name.chars())
            .filter(|c| *c != '\0')
            .collect()
    }
}

impl Default for FiberConfig {
    fn default() -> Self {
        FiberConfig {
            stack_size: DEFAULT_STACK_SIZE,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}
