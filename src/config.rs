/// Default limit of nested gzip/bzip2 layers.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Settings for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Config {
    /// Maximum number of decompression steps before giving up with
    /// [`Error::DepthExceeded`](crate::Error::DepthExceeded). Tar extraction
    /// does not count.
    pub max_depth: usize,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
