//! Best-effort canonicalisation applied before the confidence gate.
//!
//! Normalisation runs on the incoming candidate so that formatting noise
//! (phone punctuation, coordinate precision) never registers as a value
//! change. Failures are never fatal: unparseable input is stored verbatim
//! rather than dropped.

/// Default dialling prefix for numbers written in national notation (GB).
pub const DEFAULT_REGION_PREFIX: &str = "+44";

/// Decimal places kept on stored coordinates.
pub const COORD_PRECISION: i32 = 5;

/// Normalise a phone number to E.164-style `+<digits>` form.
///
/// Accepts international notation (`+…`, `00…`) and national notation
/// (`0…`) under the default region. Separators (spaces, hyphens, dots,
/// parentheses) are stripped. Anything that doesn't survive as a plausible
/// number — letters, stray symbols, too few or too many digits — is
/// returned unchanged.
pub fn normalise_phone(raw: &str) -> String {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return raw.to_string();
  }

  let mut digits = String::with_capacity(trimmed.len());
  let mut international = false;
  for (i, ch) in trimmed.chars().enumerate() {
    match ch {
      '+' if i == 0 => international = true,
      '0'..='9' => digits.push(ch),
      ' ' | '-' | '.' | '(' | ')' => {}
      _ => return raw.to_string(),
    }
  }

  let e164 = if international {
    digits
  } else if let Some(rest) = digits.strip_prefix("00") {
    rest.to_string()
  } else if let Some(rest) = digits.strip_prefix('0') {
    format!("{}{rest}", &DEFAULT_REGION_PREFIX[1..])
  } else {
    return raw.to_string();
  };

  // E.164 allows at most 15 digits; anything under 8 is not a full number.
  if e164.len() < 8 || e164.len() > 15 {
    return raw.to_string();
  }

  format!("+{e164}")
}

/// Round a coordinate to [`COORD_PRECISION`] decimal places so repeated
/// extractions of the same point compare equal.
pub fn round_coord(value: f64) -> f64 {
  let factor = 10f64.powi(COORD_PRECISION);
  (value * factor).round() / factor
}
