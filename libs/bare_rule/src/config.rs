//! Limits applied to a single decode or encode call.
//!
//! [`Config`] deserializes with defaults for every missing field, so it can be
//! embedded into a host application's configuration file.

/// The largest length or count prefix any message may declare.
pub const MAX_LEN: u64 = 0x7FFF_FFFF;

/// The default for [`Config::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// The default for [`Config::max_elements`].
pub const DEFAULT_MAX_ELEMENTS: u64 = 1 << 20;

/// Settings for decoding and encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// How deeply rules may nest before the call fails.
    ///
    /// Every rule visited counts as one level, including each followed schema
    /// reference.
    pub max_depth: usize,
    /// The largest accepted length or count prefix. Values above [`MAX_LEN`]
    /// are treated as [`MAX_LEN`].
    pub max_len: u64,
    /// How many array elements and map pairs a single decode call may
    /// produce in total, across all nesting levels.
    ///
    /// Zero-width elements, f.e. [`Rule::Void`](crate::Rule::Void), consume no
    /// input, so only this bounds the output size for them.
    pub max_elements: u64,
    /// Whether optional flags other than `0` and `1` are rejected.
    ///
    /// By default, any nonzero flag means the value is present.
    pub strict_optional: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_len: MAX_LEN,
            max_elements: DEFAULT_MAX_ELEMENTS,
            strict_optional: false,
        }
    }
}

impl Config {
    /// Sets [`Self::max_depth`].
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets [`Self::max_len`].
    #[must_use]
    pub const fn with_max_len(mut self, max_len: u64) -> Self {
        self.max_len = max_len;
        self
    }

    /// Sets [`Self::max_elements`].
    #[must_use]
    pub const fn with_max_elements(mut self, max_elements: u64) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Sets [`Self::strict_optional`].
    #[must_use]
    pub const fn with_strict_optional(mut self, strict_optional: bool) -> Self {
        self.strict_optional = strict_optional;
        self
    }

    /// Gets the effective length limit.
    pub const fn len_limit(&self) -> u64 {
        if self.max_len < MAX_LEN {
            self.max_len
        } else {
            MAX_LEN
        }
    }
}
