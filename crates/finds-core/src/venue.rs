//! The Venue sub-record — entity-specific facility attributes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, confidence::FieldConfidence, listing, registry::FieldSpec};

/// Venue-specific attributes, keyed by the owning listing's id.
///
/// Lifecycle is subordinate to the Listing: created together, deleted
/// together, never observable on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
  pub listing_id: String,

  // Racquet sports
  pub tennis:                    Option<bool>,
  pub tennis_total_courts:       Option<i64>,
  pub tennis_indoor_courts:      Option<i64>,
  pub tennis_floodlit_courts:    Option<i64>,
  pub padel:                     Option<bool>,
  pub padel_total_courts:        Option<i64>,
  pub padel_covered_courts:      Option<i64>,
  pub pickleball:                Option<bool>,
  pub pickleball_total_courts:   Option<i64>,
  pub badminton:                 Option<bool>,
  pub badminton_total_courts:    Option<i64>,
  pub squash:                    Option<bool>,
  pub squash_total_courts:       Option<i64>,
  pub squash_glass_back_courts:  Option<i64>,
  pub table_tennis:              Option<bool>,
  pub table_tennis_total_tables: Option<i64>,

  // Swimming
  pub indoor_pool:          Option<bool>,
  pub outdoor_pool:         Option<bool>,
  pub indoor_pool_length_m: Option<i64>,
  pub swimming_lessons:     Option<bool>,

  // Gym and classes
  pub gym_available:    Option<bool>,
  pub classes_per_week: Option<i64>,

  // Spa and wellness
  pub spa_available: Option<bool>,
  pub sauna:         Option<bool>,
  pub steam_room:    Option<bool>,

  // Hospitality and access
  pub cafe_on_site:    Option<bool>,
  pub parking_on_site: Option<bool>,

  // Social proof
  pub google_rating:       Option<f64>,
  pub google_review_count: Option<i64>,

  pub field_confidence: FieldConfidence,
}

impl Venue {
  pub fn new(listing_id: &str) -> Self {
    Self {
      listing_id: listing_id.to_string(),
      ..Self::default()
    }
  }

  /// The manifest-driven JSON view the merge engine operates on.
  pub fn data_map(&self, fields: &[FieldSpec]) -> Result<Map<String, Value>> {
    listing::data_map_of(self, fields)
  }

  /// Rebuild the typed struct from a merged field map.
  pub fn apply_data_map(&mut self, data: Map<String, Value>) -> Result<()> {
    *self = listing::overlay(self, data)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::registry::VENUE_FIELDS;

  #[test]
  fn manifest_matches_struct_fields() {
    // Every manifest entry must round-trip through the serialised struct;
    // a name drifting out of sync would silently stop merging.
    let venue = Venue::new("VEN-test");
    let full = serde_json::to_value(&venue).unwrap();
    let object = full.as_object().unwrap();
    for spec in VENUE_FIELDS {
      assert!(object.contains_key(spec.name), "missing field {}", spec.name);
    }
  }

  #[test]
  fn apply_data_map_sets_typed_fields() {
    let mut venue = Venue::new("VEN-test");
    let mut map = venue.data_map(VENUE_FIELDS).unwrap();
    map.insert("tennis".into(), json!(true));
    map.insert("tennis_total_courts".into(), json!(6));
    venue.apply_data_map(map).unwrap();

    assert_eq!(venue.tennis, Some(true));
    assert_eq!(venue.tennis_total_courts, Some(6));
    assert_eq!(venue.listing_id, "VEN-test");
  }
}
