/// Utility functions for numeric conversion and formatting
use time::macros::format_description;
use time::OffsetDateTime;

/// Full-scale count of the 12-bit ADC
pub const ADC_MAX_COUNT: f64 = 4095.0;

/// Round to two decimal places, the precision used for printed and transmitted values
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a raw ADC count to volts for the given reference voltage
pub fn adc_to_voltage(count: f64, reference: f64) -> f64 {
    count / ADC_MAX_COUNT * reference
}

/// Linear re-mapping of `x` from one range to another, like Arduino's `map` for floats
pub fn map_range(x: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}
