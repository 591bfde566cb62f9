//! Numeric values with standard uncertainty.
//!
//! A [`Number`] is stored as its rendered text plus the (value, su) pair that
//! text parses to. Constructing from doubles renders first and re-parses, so
//! `Number::from_str(&n.to_string())` always reproduces `n` exactly.

use std::fmt;
use std::str::FromStr;

use crate::status::{CifError, Result};

/// Largest accepted magnitude of a decimal scale.
pub const SCALE_LIMIT: i32 = 300;

/// Default rounding rule for automatic precision (the CIF "rule of 19").
pub const DEFAULT_ROUNDING_RULE: u32 = 19;

/// Default number of zeros allowed after the decimal point before switching
/// to exponent notation.
pub const DEFAULT_MAX_LEADING_ZEROES: u32 = 5;

/// A measured value, its standard uncertainty, and its textual form.
#[derive(Debug, Clone)]
pub struct Number {
    value: f64,
    su: f64,
    scale: i32,
    text: String,
}

impl Number {
    /// Build a number with an explicit decimal `scale`.
    ///
    /// `scale` is the number of digits after the decimal point (negative to
    /// round to tens, hundreds, ...). The uncertainty is rounded to the same
    /// place; if it rounds to zero the number is exact.
    pub fn with_scale(value: f64, su: f64, scale: i32, max_leading_zeroes: u32) -> Result<Self> {
        check_inputs(value, su)?;
        if !(-SCALE_LIMIT..=SCALE_LIMIT).contains(&scale) {
            return Err(CifError::Argument(format!("scale {scale} out of range")));
        }
        let text = render(value, su, scale, max_leading_zeroes);
        text.parse()
    }

    /// Build a number whose precision is derived from its uncertainty.
    ///
    /// For a non-zero `su`, the scale is the largest one at which the
    /// uncertainty's digits, read as an integer, do not exceed
    /// `rounding_rule`. Larger rules therefore retain more digits. An exact
    /// number (`su == 0`) keeps the shortest text that re-parses to `value`.
    /// Inputs that would need more than [`SCALE_LIMIT`] decimals fail with
    /// [`CifError::Argument`] rather than losing their uncertainty.
    pub fn auto(value: f64, su: f64, rounding_rule: u32, max_leading_zeroes: u32) -> Result<Self> {
        check_inputs(value, su)?;
        if rounding_rule < 2 {
            return Err(CifError::Argument(format!(
                "rounding rule {rounding_rule} is below 2"
            )));
        }
        let scale = if su == 0.0 {
            exact_scale(value)?
        } else {
            su_scale(su, rounding_rule)?
        };
        Self::with_scale(value, su, scale, max_leading_zeroes)
    }

    /// An exact number in shortest form.
    pub fn exact(value: f64) -> Result<Self> {
        Self::auto(value, 0.0, DEFAULT_ROUNDING_RULE, DEFAULT_MAX_LEADING_ZEROES)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Standard uncertainty; `0.0` for exact numbers.
    pub fn su(&self) -> f64 {
        self.su
    }

    /// Digits after the decimal point implied by the text.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn is_exact(&self) -> bool {
        self.su == 0.0
    }

    /// The rendered text, e.g. `6.02214086(7)`.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for Number {
    fn default() -> Self {
        Self {
            value: 0.0,
            su: 0.0,
            scale: 0,
            text: "0".to_string(),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.su == other.su
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Number {
    type Err = CifError;

    /// Parse CIF numeric text: `[+-]digits[.digits][e[+-]digits][(digits)]`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CifError::InvalidNumber(s.to_string());
        let bytes = s.as_bytes();
        let mut pos = 0;

        if matches!(bytes.first(), Some(b'+' | b'-')) {
            pos += 1;
        }
        let int_digits = count_digits(&bytes[pos..]);
        pos += int_digits;
        let mut frac_digits = 0;
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            frac_digits = count_digits(&bytes[pos..]);
            pos += frac_digits;
        }
        if int_digits + frac_digits == 0 {
            return Err(invalid());
        }
        let mut exponent: i64 = 0;
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            let start = pos + 1;
            let mut end = start;
            if matches!(bytes.get(end), Some(b'+' | b'-')) {
                end += 1;
            }
            let digits = count_digits(&bytes[end..]);
            if digits == 0 {
                return Err(invalid());
            }
            end += digits;
            exponent = s[start..end].parse().map_err(|_| invalid())?;
            pos = end;
        }
        let mantissa_end = pos;

        let mut su_digits = None;
        if bytes.get(pos) == Some(&b'(') {
            let digits = count_digits(&bytes[pos + 1..]);
            if digits == 0 || bytes.get(pos + 1 + digits) != Some(&b')') {
                return Err(invalid());
            }
            su_digits = Some(&s[pos + 1..pos + 1 + digits]);
            pos += digits + 2;
        }
        if pos != bytes.len() {
            return Err(invalid());
        }

        let scale = (frac_digits as i64)
            .checked_sub(exponent)
            .filter(|scale| scale.unsigned_abs() <= 2 * SCALE_LIMIT as u64)
            .ok_or_else(invalid)?;
        let value: f64 = s[..mantissa_end].parse().map_err(|_| invalid())?;
        let su = match su_digits {
            Some(digits) => format!("{digits}e{}", -scale).parse().map_err(|_| invalid())?,
            None => 0.0,
        };
        if !value.is_finite() || !f64::is_finite(su) {
            return Err(invalid());
        }
        Ok(Self {
            value,
            su,
            scale: scale as i32,
            text: s.to_string(),
        })
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn check_inputs(value: f64, su: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CifError::Argument(format!("value {value} is not finite")));
    }
    if !su.is_finite() || su < 0.0 {
        return Err(CifError::Argument(format!(
            "uncertainty {su} must be finite and non-negative"
        )));
    }
    Ok(())
}

/// Scale of the shortest decimal text that round-trips `value`.
///
/// Fails if that text needs more than [`SCALE_LIMIT`] decimals.
fn exact_scale(value: f64) -> Result<i32> {
    // `{:e}` is the shortest round-trip form, e.g. `1.2345e-5`.
    let formatted = format!("{:e}", value.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let decimals = mantissa.split_once('.').map_or(0, |(_, frac)| frac.len()) as i32;
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let scale = decimals - exponent;
    if scale > SCALE_LIMIT {
        return Err(CifError::Argument(format!(
            "value {value:e} needs {scale} decimals, more than {SCALE_LIMIT}"
        )));
    }
    Ok(scale.max(-SCALE_LIMIT))
}

/// Largest scale at which `round(su * 10^scale) <= rule`, within
/// `±SCALE_LIMIT`.
///
/// Fails if the uncertainty still rounds to zero at the finest scale.
fn su_scale(su: f64, rule: u32) -> Result<i32> {
    let rule = f64::from(rule);
    let digits_at = |scale: i32| (su * 10f64.powi(scale)).round();
    // rule / su is infinite for subnormal su; the cast saturates
    let mut scale = ((rule / su).log10().floor() as i32).clamp(-SCALE_LIMIT, SCALE_LIMIT);
    while scale > -SCALE_LIMIT && digits_at(scale) > rule {
        scale -= 1;
    }
    while scale < SCALE_LIMIT && digits_at(scale + 1) <= rule {
        scale += 1;
    }
    // a tiny rule can round the uncertainty away entirely; keep one digit
    while scale < SCALE_LIMIT && digits_at(scale) == 0.0 {
        scale += 1;
    }
    if digits_at(scale) == 0.0 {
        return Err(CifError::Argument(format!(
            "uncertainty {su:e} vanishes at {SCALE_LIMIT} decimals"
        )));
    }
    Ok(scale)
}

/// Render `value(su)` at `scale`, switching to exponent notation when more
/// than `max_leading_zeroes` zeros would follow the decimal point.
fn render(value: f64, su: f64, scale: i32, max_leading_zeroes: u32) -> String {
    let negative = value.is_sign_negative();
    let magnitude = value.abs();

    let mut body = if scale >= 0 {
        let fixed = format!("{:.*}", scale as usize, magnitude);
        match fixed.strip_prefix("0.") {
            Some(frac) => {
                let zeros = frac.bytes().take_while(|&b| b == b'0').count();
                if zeros < frac.len() && zeros > max_leading_zeroes as usize {
                    exponent_form(&frac[zeros..], -(zeros as i32) - 1)
                } else {
                    fixed
                }
            }
            None => fixed,
        }
    } else {
        let mantissa = (magnitude / 10f64.powi(-scale)).round();
        format!("{mantissa:.0}E{}", -scale)
    };

    let all_zero = body.bytes().all(|b| matches!(b, b'0' | b'.'));
    if negative && !all_zero {
        body.insert(0, '-');
    }

    let su_digits = (su * 10f64.powi(scale)).round();
    if su_digits > 0.0 {
        body.push_str(&format!("({su_digits:.0})"));
    }
    body
}

/// `d1.d2d3...e<exponent>` from a run of significant digits.
fn exponent_form(digits: &str, exponent: i32) -> String {
    let (lead, rest) = digits.split_at(1);
    if rest.is_empty() {
        format!("{lead}e{exponent}")
    } else {
        format!("{lead}.{rest}e{exponent}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn parse_plain_and_su() {
        let n: Number = "50.123(4)".parse().unwrap();
        assert_eq!(n.value(), 50.123);
        assert!(close(n.su(), 0.004, 1e-15));
        assert_eq!(n.scale(), 3);
        assert_eq!(n.text(), "50.123(4)");

        let n: Number = "-1.5e-3".parse().unwrap();
        assert_eq!(n.value(), -0.0015);
        assert!(n.is_exact());
        assert_eq!(n.scale(), 4);

        let n: Number = ".5".parse().unwrap();
        assert_eq!(n.value(), 0.5);

        let n: Number = "12E2(3)".parse().unwrap();
        assert_eq!(n.value(), 1200.0);
        assert_eq!(n.su(), 300.0);
    }

    #[test]
    fn parse_rejects_non_numbers() {
        for text in ["", "abc", "1.2.3", "1e", "1(2", "1()", "(2)", "inf", "NaN", "1 2", "+", "."] {
            assert!(
                matches!(text.parse::<Number>(), Err(CifError::InvalidNumber(_))),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn explicit_scale_rendering() {
        let n = Number::with_scale(3.14159, 0.0021, 3, 5).unwrap();
        assert_eq!(n.text(), "3.142(2)");
        let n = Number::with_scale(0.000012345, 0.0, 9, 2).unwrap();
        assert_eq!(n.text(), "1.2345e-5");
        let n = Number::with_scale(0.000012345, 0.0, 9, 5).unwrap();
        assert_eq!(n.text(), "0.000012345");
        let n = Number::with_scale(123456.0, 1234.0, -2, 5).unwrap();
        assert_eq!(n.text(), "1235E2(12)");
        assert_eq!(n.value(), 123500.0);
        assert_eq!(n.su(), 1200.0);
    }

    #[test]
    fn negative_zero_renders_unsigned() {
        let n = Number::with_scale(-0.0001, 0.0, 2, 5).unwrap();
        assert_eq!(n.text(), "0.00");
    }

    #[test]
    fn rule_of_nineteen() {
        let value = 6.022140857;
        let su = 74e-9;

        let wide = Number::auto(value, su, 99, DEFAULT_MAX_LEADING_ZEROES).unwrap();
        assert_eq!(wide.text(), "6.022140857(74)");
        assert!(close(wide.su(), su, 1e-20));

        let narrow = Number::auto(value, su, 19, DEFAULT_MAX_LEADING_ZEROES).unwrap();
        assert_eq!(narrow.text(), "6.02214086(7)");
        assert!(close(narrow.su(), 7e-8, 1e-20));
    }

    #[test]
    fn auto_keeps_two_digits_under_rule() {
        let n = Number::auto(3.14, 0.01, 19, 5).unwrap();
        assert_eq!(n.text(), "3.140(10)");
        let n = Number::auto(1.2345, 0.0015, 19, 5).unwrap();
        assert_eq!(n.text(), "1.2345(15)");
        let n = Number::auto(1.2345, 0.0025, 19, 5).unwrap();
        assert_eq!(n.text(), "1.234(3)");
    }

    #[test]
    fn exact_numbers_use_shortest_form() {
        assert_eq!(Number::exact(0.05).unwrap().text(), "0.05");
        assert_eq!(Number::exact(0.0).unwrap().text(), "0");
        assert_eq!(Number::exact(1500.0).unwrap().text(), "15E2");
        assert_eq!(Number::exact(1500.0).unwrap().value(), 1500.0);
        assert_eq!(Number::exact(-2.5).unwrap().text(), "-2.5");
    }

    #[test]
    fn invalid_arguments() {
        assert!(matches!(Number::auto(f64::NAN, 0.0, 19, 5), Err(CifError::Argument(_))));
        assert!(matches!(Number::auto(1.0, -0.1, 19, 5), Err(CifError::Argument(_))));
        assert!(matches!(Number::auto(1.0, 0.1, 1, 5), Err(CifError::Argument(_))));
        assert!(matches!(Number::with_scale(1.0, 0.0, 301, 5), Err(CifError::Argument(_))));
    }

    #[test]
    fn equality_ignores_text() {
        let a: Number = "1.0".parse().unwrap();
        let b: Number = "1.00".parse().unwrap();
        assert_eq!(a, b);
        let c: Number = "1.0(1)".parse().unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn extreme_exponents_are_invalid() {
        for text in [
            "1.5e-9223372036854775807",
            "1.5e9223372036854775807",
            "1e-9223372036854775808",
            "1e99999999999999999999",
            "1.0e-700(3)",
        ] {
            assert!(
                matches!(text.parse::<Number>(), Err(CifError::InvalidNumber(_))),
                "{text} should not parse"
            );
        }
        // within range the exponent is honored
        let n: Number = "1.5e-300".parse().unwrap();
        assert_eq!(n.scale(), 301);
        assert_eq!(n.value(), 1.5e-300);
    }

    #[test]
    fn subnormal_inputs_fail_instead_of_losing_precision() {
        assert!(matches!(Number::auto(1.0, 1e-310, 19, 5), Err(CifError::Argument(_))));
        assert!(matches!(Number::auto(1.0, f64::MIN_POSITIVE / 4.0, 99, 5), Err(CifError::Argument(_))));
        assert!(matches!(Number::exact(1e-310), Err(CifError::Argument(_))));
    }

    #[test]
    fn huge_uncertainty_stays_in_range() {
        let n = Number::auto(1.0e307, 1.0e305, 19, 5).unwrap();
        assert!(n.scale() >= -SCALE_LIMIT);
        assert!(n.su() > 0.0);
        let reparsed: Number = n.text().parse().unwrap();
        assert_eq!(reparsed, n);
    }

    proptest! {
        // Any text the parser accepts renders back to itself.
        #[test]
        fn exponent_text_never_panics(mantissa in -1.0e3f64..1.0e3, exponent in any::<i64>()) {
            let text = format!("{mantissa}e{exponent}");
            if let Ok(n) = text.parse::<Number>() {
                prop_assert_eq!(n.text(), text.as_str());
                prop_assert!(n.value().is_finite());
            }
        }

        #[test]
        fn auto_handles_any_magnitude(
            value in -1.0e300f64..1.0e300,
            su_exp in -323i32..300,
            rule in 2u32..200,
        ) {
            let su = 10f64.powi(su_exp);
            prop_assume!(su > 0.0);
            match Number::auto(value, su, rule, DEFAULT_MAX_LEADING_ZEROES) {
                Ok(n) => {
                    prop_assert!(n.su() > 0.0);
                    let reparsed: Number = n.text().parse().unwrap();
                    prop_assert_eq!(&reparsed, &n);
                }
                Err(err) => prop_assert!(matches!(err, CifError::Argument(_))),
            }
        }

        // Rendering then re-parsing is exact; the stored pair stays within half
        // a unit in the last retained place of the request.
        #[test]
        fn auto_round_trip(value in -1.0e6f64..1.0e6, su in 1.0e-6f64..10.0, rule in 2u32..200) {
            let n = Number::auto(value, su, rule, DEFAULT_MAX_LEADING_ZEROES).unwrap();
            let reparsed: Number = n.text().parse().unwrap();
            prop_assert_eq!(&reparsed, &n);

            let unit = 10f64.powi(-n.scale());
            let slack = 1e-9 * (1.0 + value.abs());
            prop_assert!(close(n.value(), value, unit / 2.0 + slack));
            prop_assert!(close(n.su(), su, unit / 2.0 + slack));
        }

        #[test]
        fn larger_rule_retains_more(value in -1.0e3f64..1.0e3, su in 1.0e-4f64..1.0, rule in 2u32..100) {
            let coarse = Number::auto(value, su, rule, DEFAULT_MAX_LEADING_ZEROES).unwrap();
            let fine = Number::auto(value, su, rule * 10, DEFAULT_MAX_LEADING_ZEROES).unwrap();
            prop_assert!(fine.scale() >= coarse.scale());
        }

        #[test]
        fn exact_round_trip(value in -1.0e9f64..1.0e9) {
            let n = Number::exact(value).unwrap();
            prop_assert_eq!(n.value(), value);
            prop_assert!(n.is_exact());
        }
    }
}
