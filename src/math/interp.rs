//! Midpoint interpolation for tenors a source does not publish.
//!
//! The US Treasury curve has no 4/6/8-year points and the Bank of Canada set has
//! no 4-year point; those columns are filled with the rounded mean of the two
//! neighbouring published tenors.

use crate::domain::TenorValue;
use crate::error::AppError;

/// Round to two decimals, half away from zero.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Mean of two values rounded to two decimals.
pub fn average(a: f64, b: f64) -> f64 {
    round2((a + b) / 2.0)
}

/// Build the tenor `name` as the midpoint of `a` and `b`.
pub fn interpolate(name: &str, a: &TenorValue, b: &TenorValue) -> Result<TenorValue, AppError> {
    let value = average(a.numeric_value, b.numeric_value);
    if !value.is_finite() {
        return Err(AppError::parse(format!(
            "cannot derive {name} from {}={} and {}={}",
            a.tenor_name, a.raw_text, b.tenor_name, b.raw_text
        )));
    }
    Ok(TenorValue {
        tenor_name: name.to_string(),
        raw_text: format!("{value:.2}"),
        numeric_value: value,
    })
}
