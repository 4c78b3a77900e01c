//! Numeric helpers centralizing safe casts, rounding, and null-aware ratios.

use num_traits::cast::cast;

/// Convert a count to f64, returning 0.0 if the cast is not representable.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a u64 count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Round to `decimals` places, leaving non-finite values untouched.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// `numerator / denominator`, or `None` when the denominator is zero.
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// Count-based ratio rounded to `decimals` places.
#[must_use]
pub fn rounded_ratio(numerator: usize, denominator: usize, decimals: i32) -> Option<f64> {
    ratio(count_to_f64(numerator), count_to_f64(denominator)).map(|v| round_to(v, decimals))
}

/// Running mean over values that may be absent; absent values are skipped.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn add_opt(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.add(value);
        }
    }

    pub fn add_flag(&mut self, flag: bool) {
        self.add(if flag { 1.0 } else { 0.0 });
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        ratio(self.sum, count_to_f64(self.count))
    }

    #[must_use]
    pub fn rounded_mean(&self, decimals: i32) -> Option<f64> {
        self.mean().map(|v| round_to(v, decimals))
    }
}
