//! Per-field confidence scores attached to each sub-record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from field name to a confidence score in `[0.0, 1.0]`.
///
/// One map travels with each sub-record; every populated field carries an
/// entry. The overwrite gating itself lives in [`crate::merge`] — this type
/// only stores scores, and `set` overwrites unconditionally. Scores are
/// clamped on write so a misbehaving extraction cannot smuggle
/// out-of-range values into the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldConfidence(BTreeMap<String, f64>);

impl FieldConfidence {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stored score for `field`, defaulting to 0.0 when absent.
  pub fn get(&self, field: &str) -> f64 {
    self.0.get(field).copied().unwrap_or(0.0)
  }

  /// Overwrite unconditionally, clamped to `[0.0, 1.0]`.
  pub fn set(&mut self, field: &str, score: f64) {
    self.0.insert(field.to_string(), score.clamp(0.0, 1.0));
  }

  /// Keep the higher of the stored and offered scores.
  pub fn raise_to(&mut self, field: &str, score: f64) {
    let merged = self.get(field).max(score.clamp(0.0, 1.0));
    self.0.insert(field.to_string(), merged);
  }

  /// Guarantee an entry exists, defaulting to 0.0.
  pub fn ensure(&mut self, field: &str) {
    self.0.entry(field.to_string()).or_insert(0.0);
  }

  /// Merge another score map, keeping per-field maxima.
  pub fn absorb_max(&mut self, other: &FieldConfidence) {
    for (field, score) in &other.0 {
      self.raise_to(field, *score);
    }
  }

  /// A copy restricted to the given field names.
  pub fn restrict<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Self {
    let mut out = BTreeMap::new();
    for name in fields {
      if let Some(score) = self.0.get(name) {
        out.insert(name.to_string(), *score);
      }
    }
    Self(out)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
    self.0.iter().map(|(field, score)| (field.as_str(), *score))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }
}
