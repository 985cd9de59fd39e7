//! Candidate records — one extraction pass's proposed values.

use serde_json::{Map, Value};

use crate::{Error, Result, confidence::FieldConfidence, listing::SourceInfo, merge};

pub const FIELD_CONFIDENCE_KEY: &str = "field_confidence";
pub const SOURCE_INFO_KEY: &str = "source_info";

/// One source's proposed field values, per-field confidence scores, and
/// provenance — not yet merged into any persisted record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateRecord {
  /// Proposed data fields. Nulls are stripped on construction so "absent"
  /// has a single spelling.
  pub fields: Map<String, Value>,
  pub field_confidence: FieldConfidence,
  pub source_info: Option<SourceInfo>,
}

impl CandidateRecord {
  /// Build a candidate from a raw JSON object, extracting and removing the
  /// `field_confidence` and `source_info` meta entries — they are handled
  /// specially by the orchestrator, never merged as data fields.
  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(mut fields) = value else {
      return Err(Error::NotAnObject);
    };

    let field_confidence = match fields.remove(FIELD_CONFIDENCE_KEY) {
      None | Some(Value::Null) => FieldConfidence::new(),
      Some(Value::Object(scores)) => {
        let mut conf = FieldConfidence::new();
        for (field, score) in &scores {
          let Some(score) = score.as_f64() else {
            return Err(Error::InvalidField {
              field: field.clone(),
              reason: "confidence score must be a number".to_string(),
            });
          };
          conf.set(field, score);
        }
        conf
      }
      Some(_) => {
        return Err(Error::InvalidField {
          field: FIELD_CONFIDENCE_KEY.to_string(),
          reason: "expected an object of field → score".to_string(),
        });
      }
    };

    let source_info = match fields.remove(SOURCE_INFO_KEY) {
      None | Some(Value::Null) => None,
      Some(value) => Some(serde_json::from_value::<SourceInfo>(value).map_err(|e| {
        Error::InvalidField {
          field: SOURCE_INFO_KEY.to_string(),
          reason: e.to_string(),
        }
      })?),
    };

    fields.retain(|_, value| !value.is_null());

    Ok(Self {
      fields,
      field_confidence,
      source_info,
    })
  }

  /// Fold another source's candidate into this one before a single upsert
  /// (progressive augmentation): fields merge additively, confidences keep
  /// their per-field maxima, provenance accumulates.
  ///
  /// Scalar conflicts resolve first-non-null-wins, so absorb order matters
  /// when sources disagree.
  pub fn absorb(&mut self, other: CandidateRecord) {
    merge::deep_merge(&mut self.fields, &other.fields);
    self.field_confidence.absorb_max(&other.field_confidence);
    match (&mut self.source_info, other.source_info) {
      (Some(mine), Some(theirs)) => mine.merge_from(&theirs),
      (slot @ None, Some(theirs)) => *slot = Some(theirs),
      (_, None) => {}
    }
  }

  /// A source that yielded no usable data merges as a no-op.
  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }
}
