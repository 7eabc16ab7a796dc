use std::{fmt, num::ParseFloatError, sync::Arc};

use snafu::{ensure, OptionExt as _, ResultExt as _, Snafu};

/// Default bucket boundaries, in milliseconds.
pub const DEFAULT_BOUNDARIES: [f64; 19] = [
    0.0, 5.0, 10.0, 25.0, 50.0, 75.0, 100.0, 250.0, 500.0, 750.0, 1_000.0, 2_500.0, 5_000.0, 7_500.0, 10_000.0,
    30_000.0, 60_000.0, 90_000.0, 120_000.0,
];

/// A bucket boundary parsing error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum BoundaryParseError {
    /// A boundary could not be parsed as a number.
    #[snafu(display("Bucket boundary '{}' at position {} is not a valid number.", token, position))]
    InvalidBoundary {
        /// The offending token, trimmed.
        token: String,

        /// Zero-based position of the token in the list.
        position: usize,

        /// Error source.
        source: ParseFloatError,
    },

    /// A boundary parsed as NaN or an infinity.
    #[snafu(display("Bucket boundary '{}' at position {} is not finite.", token, position))]
    NonFiniteBoundary {
        /// The offending token, trimmed.
        token: String,

        /// Zero-based position of the token in the list.
        position: usize,
    },

    /// No boundaries were given.
    #[snafu(display("No bucket boundaries were given."))]
    Empty,
}

/// An ordered set of histogram bucket boundaries.
///
/// A boundary set is never empty. Boundaries are expected to be in strictly ascending order, but this is not enforced
/// here: the aggregation consuming the set is responsible for validating that, and
/// [`is_strictly_ascending`][Self::is_strictly_ascending] is available for callers who want to check ahead of time.
///
/// Cloning is cheap, as the boundaries are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundarySet {
    boundaries: Arc<[f64]>,
}

impl BoundarySet {
    /// Creates a boundary set from the given values.
    ///
    /// Returns `None` if `boundaries` is empty.
    pub fn new(boundaries: Vec<f64>) -> Option<Self> {
        if boundaries.is_empty() {
            return None;
        }

        Some(Self {
            boundaries: boundaries.into(),
        })
    }

    /// Parses a comma-separated list of boundaries, such as `0, 10, 50, 200`.
    ///
    /// Whitespace around each boundary is ignored, and so are trailing commas: `1,2,,` is the same as `1,2`. The whole
    /// list is rejected if any single boundary is invalid.
    ///
    /// # Errors
    ///
    /// If any boundary is not a valid finite number (including empty entries, as in `0,,10`), or if the input is made
    /// only of commas, an error is returned.
    pub fn parse(input: &str) -> Result<Self, BoundaryParseError> {
        let input = input.trim_end_matches(',');
        ensure!(!input.is_empty(), Empty);

        let boundaries = input
            .split(',')
            .enumerate()
            .map(|(position, token)| parse_boundary(position, token.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(boundaries).context(Empty)
    }

    /// Returns the boundaries as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.boundaries
    }

    /// Returns an iterator over the boundaries.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.boundaries.iter()
    }

    /// Returns `true` if every boundary is strictly greater than the one before it.
    pub fn is_strictly_ascending(&self) -> bool {
        self.boundaries.windows(2).all(|pair| pair[0] < pair[1])
    }
}

fn parse_boundary(position: usize, token: &str) -> Result<f64, BoundaryParseError> {
    let value = token.parse::<f64>().context(InvalidBoundary { token, position })?;
    ensure!(value.is_finite(), NonFiniteBoundary { token, position });
    Ok(value)
}

impl Default for BoundarySet {
    fn default() -> Self {
        Self {
            boundaries: DEFAULT_BOUNDARIES.as_slice().into(),
        }
    }
}

impl AsRef<[f64]> for BoundarySet {
    fn as_ref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl<'a> IntoIterator for &'a BoundarySet {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for BoundarySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, boundary) in self.boundaries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", boundary)?;
        }
        write!(f, "]")
    }
}
