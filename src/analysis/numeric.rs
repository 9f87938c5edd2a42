use serde_json::Value;

/// Parse an effort value as the tracking service stores it.
///
/// Accepts JSON numbers and strings using either "." or "," as the decimal
/// separator. Only the first "," is rewritten and only the leading numeric
/// literal is read, so `"3,5h"` is 3.5. Returns NaN when nothing parses.
pub fn parse_locale_float(value: Option<&Value>) -> f64 {
    let text = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return f64::NAN,
        Some(Value::Number(number)) => return number.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.replacen(',', ".", 1),
        Some(other) => other.to_string(),
    };

    parse_float_prefix(&text)
}

/// Effort value for arithmetic: anything that is not a finite number counts as 0.
pub fn effort(value: Option<&Value>) -> f64 {
    let parsed = parse_locale_float(value);
    if parsed.is_finite() {
        parsed
    } else {
        0.0
    }
}

fn parse_float_prefix(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when digits follow it.
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
