use crate::adjustment::Reading;

/// Applies a calibration offset to a reading and formats it for delivery.
///
/// An absent reading yields an empty string. An offset that does not parse
/// as a finite decimal counts as zero. When `allow_negative` is false, any
/// corrected value at or below zero is reported as `"0"`.
pub fn adjust(reading: Reading, offset: &str, allow_negative: bool) -> String {
    let Some(value) = reading.value() else {
        return String::new();
    };

    let corrected = value + parse_offset(offset);

    if !allow_negative && corrected <= 0.0 {
        return "0".to_string();
    }

    format!("{corrected:.2}")
}

fn parse_offset(offset: &str) -> f64 {
    match offset.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
