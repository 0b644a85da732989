//! Sweep value generation.
//!
//! A [`SweepRange`] enumerates `start, start + step, start + 2*step, ...`
//! while the running value stays below `end`. Values are produced by repeated
//! addition, so accumulated floating-point drift is kept as-is: the number of
//! values can differ by one from `(end - start) / step`.

use serde::{Deserialize, Serialize};

/// Reference sweep start value.
pub const DEFAULT_START: f64 = 0.00001;
/// Reference sweep end value (exclusive).
pub const DEFAULT_END: f64 = 1.0;
/// Reference sweep step.
pub const DEFAULT_STEP: f64 = 0.00005;

/// Half-open range of sweep values with a fixed step.
///
/// # Example TOML
///
/// ```toml
/// [sweep]
/// start = 0.00001
/// end = 1.0
/// step = 0.00005
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SweepRange {
    /// First emitted value (inclusive).
    #[serde(default = "default_start")]
    pub start: f64,
    /// Upper bound (exclusive).
    #[serde(default = "default_end")]
    pub end: f64,
    /// Increment between consecutive values. Must be strictly positive.
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_start() -> f64 {
    DEFAULT_START
}

fn default_end() -> f64 {
    DEFAULT_END
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_START,
            end: DEFAULT_END,
            step: DEFAULT_STEP,
        }
    }
}

impl SweepRange {
    /// Creates a range from its three bounds.
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// Returns `true` if the range produces at least one value.
    ///
    /// A range with `step <= 0`, `start >= end`, or a non-finite bound is
    /// empty rather than an error.
    pub fn is_valid(&self) -> bool {
        self.start.is_finite()
            && self.end.is_finite()
            && self.step.is_finite()
            && self.step > 0.0
            && self.start < self.end
    }

    /// Returns `true` if the range produces no values.
    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    /// Counts the values the range produces by walking it.
    ///
    /// This always agrees with [`SweepRange::iter`], drift included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns a fresh iterator over the sweep values. Each call restarts
    /// from `start`.
    pub fn iter(&self) -> SweepValues {
        SweepValues {
            current: self.start,
            end: self.end,
            step: self.step,
            exhausted: !self.is_valid(),
        }
    }
}

impl IntoIterator for &SweepRange {
    type Item = f64;
    type IntoIter = SweepValues;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the values of a [`SweepRange`].
#[derive(Debug, Clone)]
pub struct SweepValues {
    current: f64,
    end: f64,
    step: f64,
    exhausted: bool,
}

impl Iterator for SweepValues {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.exhausted || self.current >= self.end {
            self.exhausted = true;
            return None;
        }
        let value = self.current;
        self.current += self.step;
        // A step too small to move `current` would loop forever.
        if self.current <= value {
            self.exhausted = true;
        }
        Some(value)
    }
}

impl std::iter::FusedIterator for SweepValues {}

/// Formats a sweep value as the decimal string passed to the external binary.
///
/// Uses the shortest representation that round-trips, without exponent
/// notation: `0.00001` becomes `"0.00001"`, `0.2` becomes `"0.2"`.
pub fn format_value(value: f64) -> String {
    format!("{value}")
}
