//! IntCode words
//!
//! Programs may compute values of any size, so every memory cell, register
//! and channel value is an arbitrary-precision signed integer.

use num_bigint::BigInt;

pub type Word = BigInt;

/// Collect integer-like values into words
pub fn words<I>(values: I) -> Vec<Word>
where
    I: IntoIterator,
    I::Item: Into<Word>,
{
    values.into_iter().map(Into::into).collect()
}
