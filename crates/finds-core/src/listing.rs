//! The Listing sub-record — fields common to every entity kind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
  Result,
  confidence::FieldConfidence,
  ident::{generate_listing_id, generate_slug},
  registry::FieldSpec,
};

// ─── Opening hours ───────────────────────────────────────────────────────────

/// One weekday's opening hours: an open/close pair, or closed all day.
///
/// Serialises as `{"open": "09:00", "close": "17:00"}` or the literal
/// string `"CLOSED"`; the marker is accepted case-insensitively on read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayHours {
  Open { open: String, close: String },
  Closed,
}

impl Serialize for DayHours {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Self::Open { open, close } => {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("open", open)?;
        map.serialize_entry("close", close)?;
        map.end()
      }
      Self::Closed => serializer.serialize_str("CLOSED"),
    }
  }
}

impl<'de> Deserialize<'de> for DayHours {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
      Value::String(s) if s.eq_ignore_ascii_case("closed") => Ok(Self::Closed),
      Value::Object(pair) => {
        let open = pair
          .get("open")
          .and_then(Value::as_str)
          .ok_or_else(|| de::Error::missing_field("open"))?;
        let close = pair
          .get("close")
          .and_then(Value::as_str)
          .ok_or_else(|| de::Error::missing_field("close"))?;
        Ok(Self::Open {
          open: open.to_string(),
          close: close.to_string(),
        })
      }
      other => Err(de::Error::custom(format!(
        "expected an open/close pair or \"CLOSED\", got {other}"
      ))),
    }
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Where a record's data came from: contributing source URLs plus an
/// optional free-text note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
  #[serde(default)]
  pub sources: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
}

impl SourceInfo {
  /// Additive merge: new sources append (deduplicated, original order
  /// kept) and a newer note overwrites. Previously recorded sources are
  /// never dropped.
  pub fn merge_from(&mut self, other: &SourceInfo) {
    for source in &other.sources {
      if !self.sources.contains(source) {
        self.sources.push(source.clone());
      }
    }
    if other.note.is_some() {
      self.note = other.note.clone();
    }
  }

  pub fn is_empty(&self) -> bool {
    self.sources.is_empty() && self.note.is_none()
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// The persisted, entity-type-agnostic sub-record.
///
/// `listing_id` is assigned once at creation and never changes. `slug` is
/// derived from the name at creation and deliberately *not* re-derived on
/// update, so external links keep working if naming conventions shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
  pub listing_id:  String,
  pub slug:        String,
  pub entity_name: String,
  pub entity_type: String,

  // Classification
  pub categories:           Option<Vec<String>>,
  pub canonical_categories: Option<Vec<String>>,
  /// Extra facts with no dedicated column: a JSON object or a
  /// `[{key, value}]` list, depending on the extraction pipeline.
  pub other_attributes:     Option<Value>,

  // Location
  pub street_address: Option<String>,
  pub city:           Option<String>,
  pub postcode:       Option<String>,
  pub country:        Option<String>,
  pub latitude:       Option<f64>,
  pub longitude:      Option<f64>,

  // Contact
  pub phone:         Option<String>,
  pub email:         Option<String>,
  pub website_url:   Option<String>,
  pub instagram_url: Option<String>,
  pub facebook_url:  Option<String>,
  pub twitter_url:   Option<String>,
  pub linkedin_url:  Option<String>,

  pub opening_hours: Option<BTreeMap<String, DayHours>>,

  pub source_info:      SourceInfo,
  pub field_confidence: FieldConfidence,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Listing {
  /// A fresh listing for a new identity. Ids are generated here, once.
  pub fn new(entity_name: &str, entity_type: &str, now: DateTime<Utc>) -> Self {
    Self {
      listing_id: generate_listing_id(entity_type),
      slug: generate_slug(entity_name),
      entity_name: entity_name.to_string(),
      entity_type: entity_type.to_string(),
      categories: None,
      canonical_categories: None,
      other_attributes: None,
      street_address: None,
      city: None,
      postcode: None,
      country: None,
      latitude: None,
      longitude: None,
      phone: None,
      email: None,
      website_url: None,
      instagram_url: None,
      facebook_url: None,
      twitter_url: None,
      linkedin_url: None,
      opening_hours: None,
      source_info: SourceInfo::default(),
      field_confidence: FieldConfidence::new(),
      created_at: now,
      updated_at: now,
    }
  }

  /// The manifest-driven JSON view the merge engine operates on. Absent
  /// fields appear as explicit nulls so the gate sees one spelling of
  /// "empty".
  pub fn data_map(&self, fields: &[FieldSpec]) -> Result<Map<String, Value>> {
    data_map_of(self, fields)
  }

  /// Rebuild the typed struct from a merged field map, preserving every
  /// field outside the manifest (ids, provenance, confidence, timestamps).
  pub fn apply_data_map(&mut self, data: Map<String, Value>) -> Result<()> {
    *self = overlay(self, data)?;
    Ok(())
  }
}

// ─── Field-map bridges ───────────────────────────────────────────────────────

/// Serialise `record` and keep only the manifest fields.
pub(crate) fn data_map_of<T: Serialize>(
  record: &T,
  fields: &[FieldSpec],
) -> Result<Map<String, Value>> {
  let full = match serde_json::to_value(record)? {
    Value::Object(map) => map,
    _ => Map::new(),
  };

  let mut out = Map::new();
  for spec in fields {
    out.insert(
      spec.name.to_string(),
      full.get(spec.name).cloned().unwrap_or(Value::Null),
    );
  }
  Ok(out)
}

/// Overlay `data` onto the serialised form of `record` and deserialise the
/// result back into the record type.
pub(crate) fn overlay<T: Serialize + DeserializeOwned>(
  record: &T,
  data: Map<String, Value>,
) -> Result<T> {
  let mut full = match serde_json::to_value(record)? {
    Value::Object(map) => map,
    _ => Map::new(),
  };
  for (key, value) in data {
    full.insert(key, value);
  }
  Ok(serde_json::from_value(Value::Object(full))?)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::registry::LISTING_FIELDS;

  #[test]
  fn day_hours_serde_round_trip() {
    let open = DayHours::Open {
      open: "09:00".into(),
      close: "17:00".into(),
    };
    let json = serde_json::to_value(&open).unwrap();
    assert_eq!(json, json!({"open": "09:00", "close": "17:00"}));
    assert_eq!(serde_json::from_value::<DayHours>(json).unwrap(), open);

    let closed = serde_json::to_value(DayHours::Closed).unwrap();
    assert_eq!(closed, json!("CLOSED"));
    assert_eq!(
      serde_json::from_value::<DayHours>(json!("closed")).unwrap(),
      DayHours::Closed
    );
  }

  #[test]
  fn day_hours_rejects_other_strings() {
    assert!(serde_json::from_value::<DayHours>(json!("shut")).is_err());
  }

  #[test]
  fn source_info_merge_is_additive() {
    let mut base = SourceInfo {
      sources: vec!["https://a.com".into()],
      note: Some("scraped".into()),
    };
    let incoming = SourceInfo {
      sources: vec!["https://a.com".into(), "https://b.com".into()],
      note: None,
    };

    base.merge_from(&incoming);

    assert_eq!(base.sources, vec!["https://a.com", "https://b.com"]);
    assert_eq!(base.note.as_deref(), Some("scraped"));
  }

  #[test]
  fn data_map_round_trip_preserves_internal_fields() {
    let now = Utc::now();
    let mut listing = Listing::new("Test Club", "venue", now);
    listing.field_confidence.set("phone", 0.9);
    let id = listing.listing_id.clone();

    let mut map = listing.data_map(LISTING_FIELDS).unwrap();
    map.insert("phone".into(), json!("+441315397071"));
    map.insert("city".into(), json!("Edinburgh"));
    listing.apply_data_map(map).unwrap();

    assert_eq!(listing.listing_id, id);
    assert_eq!(listing.slug, "test-club");
    assert_eq!(listing.phone.as_deref(), Some("+441315397071"));
    assert_eq!(listing.city.as_deref(), Some("Edinburgh"));
    assert_eq!(listing.field_confidence.get("phone"), 0.9);
  }
}
