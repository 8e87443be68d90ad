//! Immutable code metadata shared by every frame running the same code.

use std::fmt;
use std::sync::Arc;

/// Code object flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeFlags(u16);

impl CodeFlags {
    /// Code body is a generator body.
    pub const GENERATOR: Self = Self(0b0000_0001);
    /// Code body closes over free variables.
    pub const HAS_CLOSURE: Self = Self(0b0000_0010);
    /// Code body is a coroutine body.
    pub const COROUTINE: Self = Self(0b0000_0100);
    /// Empty flag set.
    pub const EMPTY: Self = Self(0);

    /// Returns true if this contains all bits of `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for CodeFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Metadata describing a compiled body.
///
/// # Examples
///
/// ```
/// use host_runtime::{CodeFlags, CodeMetadata};
///
/// let code = CodeMetadata::generator("numbers", "app.py", 12);
/// assert_eq!(code.name(), "numbers");
/// assert!(code.flags().contains(CodeFlags::GENERATOR));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMetadata {
    name: Arc<str>,
    qualified_name: Arc<str>,
    filename: Arc<str>,
    first_line: u32,
    flags: CodeFlags,
}

impl CodeMetadata {
    /// Creates metadata with an explicit qualified name and flags.
    pub fn new(
        name: &str,
        qualified_name: &str,
        filename: &str,
        first_line: u32,
        flags: CodeFlags,
    ) -> Self {
        Self {
            name: Arc::from(name),
            qualified_name: Arc::from(qualified_name),
            filename: Arc::from(filename),
            first_line,
            flags,
        }
    }

    /// Creates metadata for a module-level generator body.
    pub fn generator(name: &str, filename: &str, first_line: u32) -> Self {
        Self::new(name, name, filename, first_line, CodeFlags::GENERATOR)
    }

    /// Short name of the code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted name including enclosing scopes.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Source file the code was compiled from.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// First source line of the body.
    pub fn first_line(&self) -> u32 {
        self.first_line
    }

    /// Code flags.
    pub fn flags(&self) -> CodeFlags {
        self.flags
    }
}

impl fmt::Display for CodeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<code object {}, file \"{}\", line {}>",
            self.name, self.filename, self.first_line
        )
    }
}
