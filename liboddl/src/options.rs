//! Parser configuration.

/// Default bound on derived-structure nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for [`parse_with_options`](crate::parse_with_options).
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Name used in error locations (` at 3:7 of <name>`).
    pub filename: Option<String>,
    /// Deepest allowed nesting of structures. Top-level structures are at
    /// depth 1. Exceeding it is a fatal error rather than a stack overflow.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
