//! Numeric value normalization.
//!
//! Converts the displayed text of an `ix:nonFraction` element into whole
//! currency units. Arithmetic is done on an integer mantissa and a decimal
//! exponent so scaled values such as `1 234,5` with `scale="3"` come out
//! exact instead of passing through floating point.

use serde::{Deserialize, Serialize};

/// Largest number of significant digits accepted before giving up.
const MAX_DIGITS: usize = 30;

/// Texts meaning "no value reported".
const PLACEHOLDERS: &[&str] = &["", "-", "\u{2013}", "\u{2014}", "\u{2212}", "n/a", "\u{2026}"];

/// Decimal-separator convention declared by an `ixt` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// Infer the separator from the text
    Inferred,
    /// Comma is the decimal separator (`numcommadecimal`, `numspacecomma`)
    CommaDecimal,
    /// Dot is the decimal separator (`numdotdecimal`, `numcommadot`)
    DotDecimal,
    /// The value is zero whatever the text says (`zerodash`, `fixed-zero`)
    Zero,
}

impl NumberFormat {
    /// Interpret a `format` attribute such as `ixt:num-comma-decimal`.
    pub fn from_attribute(format: Option<&str>) -> Self {
        let Some(format) = format else {
            return Self::Inferred;
        };
        let name: String = crate::document::local_part(format)
            .chars()
            .filter(|c| *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        if name.contains("zerodash") || name.contains("fixedzero") {
            Self::Zero
        } else if name.contains("commadecimal") || name.ends_with("comma") {
            Self::CommaDecimal
        } else if name.contains("dotdecimal") || name.ends_with("dot") {
            Self::DotDecimal
        } else {
            Self::Inferred
        }
    }
}

/// Attributes of a numeric fact that affect its value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericAttributes<'a> {
    /// `format` attribute
    pub format: Option<&'a str>,
    /// `scale` attribute (power of ten)
    pub scale: Option<&'a str>,
    /// `sign` attribute; `-` negates the displayed value
    pub sign: Option<&'a str>,
}

/// Whether the displayed text means "nothing reported".
///
/// A zero-dash format turns a dash into a real zero, so it is not a placeholder.
pub fn is_placeholder(text: &str, format: NumberFormat) -> bool {
    if format == NumberFormat::Zero {
        return false;
    }
    let trimmed = text.trim();
    PLACEHOLDERS
        .iter()
        .any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Normalize displayed text to an integer in whole units.
///
/// Returns `None` when the text is not a number or the result does not fit.
pub fn normalize(text: &str, attrs: &NumericAttributes<'_>) -> Option<i64> {
    let format = NumberFormat::from_attribute(attrs.format);
    if format == NumberFormat::Zero {
        return Some(0);
    }

    let scale = match attrs.scale.map(str::trim) {
        None | Some("") => 0,
        Some(scale) => scale.parse::<i32>().ok()?,
    };
    let parsed = parse_decimal(text, format)?;
    let negative = parsed.negative || attrs.sign.is_some_and(|s| s.trim() == "-");

    let exponent = scale.checked_sub(i32::try_from(parsed.fraction_digits).ok()?)?;
    let magnitude = apply_exponent(parsed.mantissa, exponent)?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decimal {
    mantissa: i128,
    fraction_digits: usize,
    negative: bool,
}

fn parse_decimal(text: &str, format: NumberFormat) -> Option<Decimal> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut body = compact.as_str();
    let mut negative = false;

    if let Some(inner) = body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        body = inner;
        negative = true;
    }
    for minus in ['-', '\u{2212}', '\u{2013}'] {
        if let Some(rest) = body.strip_prefix(minus) {
            body = rest;
            negative = true;
        } else if let Some(rest) = body.strip_suffix(minus) {
            body = rest;
            negative = true;
        }
    }
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let decimal_separator = decimal_separator(body, format);
    let (integer, fraction) = match decimal_separator {
        Some(sep) => body.rsplit_once(sep).unwrap_or((body, "")),
        None => (body, ""),
    };
    // Anything left in the fraction besides digits means the guess was wrong.
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits: String = integer
        .chars()
        .chain(fraction.chars())
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() || digits.len() > MAX_DIGITS {
        return None;
    }

    Some(Decimal {
        mantissa: digits.parse().ok()?,
        fraction_digits: fraction.len(),
        negative,
    })
}

/// Pick the decimal separator, or `None` when all separators group thousands.
fn decimal_separator(body: &str, format: NumberFormat) -> Option<char> {
    let commas = body.matches(',').count();
    let dots = body.matches('.').count();
    match format {
        NumberFormat::CommaDecimal => (commas > 0).then_some(','),
        NumberFormat::DotDecimal => (dots > 0).then_some('.'),
        NumberFormat::Inferred | NumberFormat::Zero => match (commas, dots) {
            (0, 0) => None,
            (_, 0) => (commas == 1).then_some(','),
            (0, _) => (dots == 1).then_some('.'),
            // Both present: whichever comes last separates the decimals.
            _ => {
                let last_comma = body.rfind(',');
                let last_dot = body.rfind('.');
                if last_comma > last_dot { Some(',') } else { Some('.') }
            }
        },
    }
}

/// `mantissa × 10^exponent`, rounded half away from zero.
fn apply_exponent(mantissa: i128, exponent: i32) -> Option<i128> {
    if exponent >= 0 {
        let factor = 10i128.checked_pow(exponent.unsigned_abs())?;
        return mantissa.checked_mul(factor);
    }
    let Some(divisor) = 10i128.checked_pow(exponent.unsigned_abs()) else {
        return Some(0);
    };
    let quotient = mantissa / divisor;
    let remainder = mantissa % divisor;
    Some(if remainder * 2 >= divisor {
        quotient + 1
    } else {
        quotient
    })
}

/// Precision metadata kept alongside a resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Declared power-of-ten scale
    pub scale: i32,
    /// Declared decimals; `None` when `INF` or absent
    pub decimals: Option<i32>,
    /// Unit reference, e.g. `SEK`
    pub unit: Option<String>,
    /// Declared format
    pub format: Option<String>,
}

impl Precision {
    /// Build from raw attribute values.
    pub fn from_attributes(
        scale: Option<&str>,
        decimals: Option<&str>,
        unit: Option<&str>,
        format: Option<&str>,
    ) -> Self {
        Self {
            scale: scale.and_then(|s| s.trim().parse().ok()).unwrap_or(0),
            decimals: decimals
                .filter(|d| !d.trim().eq_ignore_ascii_case("inf"))
                .and_then(|d| d.trim().parse().ok()),
            unit: unit.map(str::to_string),
            format: format.map(str::to_string),
        }
    }
}
