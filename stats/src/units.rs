//! Power values as the directory displays them: watts on a 1000-step ladder,
//! three significant figures, e.g. `19.7 PW`.

use crate::error::{
    Error,
    Result,
};

const UNITS: [&str; 7] = ["W", "kW", "MW", "GW", "TW", "PW", "EW"];
const SIGNIFICANT_DIGITS: u32 = 3;

/// Relative error `parse_power(format_power(w))` may show against `w`.
pub const ROUNDING_TOLERANCE: f64 = 0.005;

/// Formats `watts` with the largest unit that keeps the mantissa at or above 1.
///
/// Rounding is half-up. A mantissa that rounds up to 1000 moves to the next
/// unit (`999_999 W` is `1.00 MW`), one that rounds up to the next power of ten
/// loses a decimal (`9_999 W` is `10.0 kW`).
pub fn format_power(watts: u64) -> String {
    if watts == 0 {
        return "0 W".to_string();
    }

    let watts = watts as u128;
    let mut unit = 0;
    while unit + 1 < UNITS.len() && watts >= unit_base(unit + 1) {
        unit += 1;
    }

    loop {
        let base = unit_base(unit);
        let integer_digits = digit_count(watts / base);
        let mut decimals = SIGNIFICANT_DIGITS.saturating_sub(integer_digits);
        let mut scaled = round_half_up(watts * 10u128.pow(decimals), base);

        if scaled >= 10u128.pow(SIGNIFICANT_DIGITS) {
            if decimals > 0 {
                decimals -= 1;
                scaled = round_half_up(watts * 10u128.pow(decimals), base);
            } else if unit + 1 < UNITS.len() {
                unit += 1;
                continue;
            }
        }

        return render(scaled, decimals, UNITS[unit]);
    }
}

/// Parses strings such as `19.7 PW`, `250MW` or `1,000 kw` back to watts.
///
/// Units are matched case-insensitively and the trailing `W` may be omitted.
pub fn parse_power(input: &str) -> Result<u64> {
    let invalid = || Error::Format {
        input: input.to_string(),
    };

    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let split = cleaned.find(|c: char| c.is_ascii_alphabetic()).ok_or_else(invalid)?;
    let (mantissa, unit) = cleaned.split_at(split);

    let mantissa: f64 = mantissa.trim().parse().map_err(|_| invalid())?;
    if !mantissa.is_finite() || mantissa < 0.0 {
        return Err(invalid());
    }

    let mut unit = unit.trim().to_ascii_lowercase();
    if !unit.ends_with('w') {
        unit.push('w');
    }
    let index = UNITS
        .iter()
        .position(|candidate| candidate.to_ascii_lowercase() == unit)
        .ok_or_else(invalid)?;

    // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
    let watts = (mantissa * unit_base(index) as f64).round();
    if watts >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(watts as u64)
}

fn unit_base(unit: usize) -> u128 {
    1000u128.pow(unit as u32)
}

fn digit_count(value: u128) -> u32 {
    value.checked_ilog10().map_or(1, |log| log + 1)
}

fn round_half_up(numerator: u128, denominator: u128) -> u128 {
    (2 * numerator + denominator) / (2 * denominator)
}

fn render(scaled: u128, decimals: u32, unit: &str) -> String {
    if decimals == 0 {
        return format!("{scaled} {unit}");
    }
    let divisor = 10u128.pow(decimals);
    format!(
        "{}.{:0width$} {unit}",
        scaled / divisor,
        scaled % divisor,
        width = decimals as usize
    )
}
