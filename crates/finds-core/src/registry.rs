//! Static field manifests per entity type.
//!
//! The listing/entity field split is declared here as data, never inferred
//! from model metadata at runtime. The manifest also tells the merge engine
//! which fields are composite and doubles as the validation schema for
//! incoming candidates.

use serde_json::Value;

use crate::{Error, Result, candidate::CandidateRecord};

// ─── Field kinds ─────────────────────────────────────────────────────────────

/// Value shape of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Integer,
  Float,
  Boolean,
  /// List of free strings (`categories`, `canonical_categories`).
  TextList,
  /// Weekday → `{open, close}` pairs or the literal `"CLOSED"`.
  Hours,
  /// Open-ended extra facts: a JSON object, or a `[{key, value}]` list.
  Attributes,
}

impl FieldKind {
  /// Composite kinds merge additively (deep merge) instead of passing
  /// through the scalar confidence gate.
  pub fn is_composite(self) -> bool {
    matches!(self, Self::TextList | Self::Hours | Self::Attributes)
  }
}

/// One statically-declared record field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
  pub name: &'static str,
  pub kind: FieldKind,
}

const fn spec(name: &'static str, kind: FieldKind) -> FieldSpec {
  FieldSpec { name, kind }
}

// ─── Manifests ───────────────────────────────────────────────────────────────

use FieldKind::*;

/// Fields of the entity-type-agnostic Listing sub-record that a candidate
/// may set. Internal columns (ids, slug, provenance, confidence,
/// timestamps) are deliberately absent.
pub const LISTING_FIELDS: &[FieldSpec] = &[
  spec("entity_name", Text),
  spec("entity_type", Text),
  spec("categories", TextList),
  spec("canonical_categories", TextList),
  spec("other_attributes", Attributes),
  spec("street_address", Text),
  spec("city", Text),
  spec("postcode", Text),
  spec("country", Text),
  spec("latitude", Float),
  spec("longitude", Float),
  spec("phone", Text),
  spec("email", Text),
  spec("website_url", Text),
  spec("instagram_url", Text),
  spec("facebook_url", Text),
  spec("twitter_url", Text),
  spec("linkedin_url", Text),
  spec("opening_hours", Hours),
];

/// Venue-specific fields. Must stay in sync with [`crate::venue::Venue`].
pub const VENUE_FIELDS: &[FieldSpec] = &[
  spec("tennis", Boolean),
  spec("tennis_total_courts", Integer),
  spec("tennis_indoor_courts", Integer),
  spec("tennis_floodlit_courts", Integer),
  spec("padel", Boolean),
  spec("padel_total_courts", Integer),
  spec("padel_covered_courts", Integer),
  spec("pickleball", Boolean),
  spec("pickleball_total_courts", Integer),
  spec("badminton", Boolean),
  spec("badminton_total_courts", Integer),
  spec("squash", Boolean),
  spec("squash_total_courts", Integer),
  spec("squash_glass_back_courts", Integer),
  spec("table_tennis", Boolean),
  spec("table_tennis_total_tables", Integer),
  spec("indoor_pool", Boolean),
  spec("outdoor_pool", Boolean),
  spec("indoor_pool_length_m", Integer),
  spec("swimming_lessons", Boolean),
  spec("gym_available", Boolean),
  spec("classes_per_week", Integer),
  spec("spa_available", Boolean),
  spec("sauna", Boolean),
  spec("steam_room", Boolean),
  spec("cafe_on_site", Boolean),
  spec("parking_on_site", Boolean),
  spec("google_rating", Float),
  spec("google_review_count", Integer),
];

// ─── Entity configuration ────────────────────────────────────────────────────

/// Storage target for the entity-specific sub-record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityTable {
  Venue,
}

/// Everything the upsert orchestrator needs to know about one entity type.
#[derive(Debug)]
pub struct EntityConfig {
  pub entity_type: &'static str,
  pub listing_fields: &'static [FieldSpec],
  pub entity_fields: &'static [FieldSpec],
  pub table: EntityTable,
}

impl EntityConfig {
  pub fn listing_field(&self, name: &str) -> Option<&FieldSpec> {
    self.listing_fields.iter().find(|s| s.name == name)
  }

  pub fn entity_field(&self, name: &str) -> Option<&FieldSpec> {
    self.entity_fields.iter().find(|s| s.name == name)
  }

  pub fn listing_field_names(&self) -> impl Iterator<Item = &'static str> {
    self.listing_fields.iter().map(|s| s.name)
  }

  pub fn entity_field_names(&self) -> impl Iterator<Item = &'static str> {
    self.entity_fields.iter().map(|s| s.name)
  }
}

const VENUE_CONFIG: EntityConfig = EntityConfig {
  entity_type: "venue",
  listing_fields: LISTING_FIELDS,
  entity_fields: VENUE_FIELDS,
  table: EntityTable::Venue,
};

/// Look up the configuration for `entity_type`.
///
/// Unknown types are a caller error, surfaced before any storage work.
pub fn entity_config(entity_type: &str) -> Result<&'static EntityConfig> {
  match entity_type {
    "venue" => Ok(&VENUE_CONFIG),
    // Future entity types (retailer, members_club, …) register here.
    other => Err(Error::UnknownEntityType(other.to_string())),
  }
}

// ─── Candidate validation ────────────────────────────────────────────────────

/// Type-check every *known* field present in `candidate`.
///
/// Unknown fields are ignored — the split step drops them silently. A known
/// field with the wrong shape condemns this candidate only (recoverable);
/// the stored record and other candidates are unaffected.
pub fn validate_candidate(config: &EntityConfig, candidate: &CandidateRecord) -> Result<()> {
  for (name, value) in &candidate.fields {
    if value.is_null() {
      continue;
    }
    let spec = config
      .listing_field(name)
      .or_else(|| config.entity_field(name));
    if let Some(spec) = spec {
      check_kind(spec, value)?;
    }
  }
  Ok(())
}

fn check_kind(spec: &FieldSpec, value: &Value) -> Result<()> {
  let ok = match spec.kind {
    Text => value.is_string(),
    Integer => value.is_i64() || value.is_u64(),
    Float => value.is_number(),
    Boolean => value.is_boolean(),
    TextList => value
      .as_array()
      .is_some_and(|items| items.iter().all(Value::is_string)),
    Hours => value
      .as_object()
      .is_some_and(|days| days.values().all(valid_day_hours)),
    Attributes => match value {
      Value::Object(_) => true,
      Value::Array(items) => items.iter().all(|item| {
        item
          .as_object()
          .is_some_and(|attr| attr.get("key").is_some_and(Value::is_string))
      }),
      _ => false,
    },
  };

  if ok {
    Ok(())
  } else {
    Err(Error::InvalidField {
      field: spec.name.to_string(),
      reason: expected_shape(spec.kind).to_string(),
    })
  }
}

fn valid_day_hours(value: &Value) -> bool {
  match value {
    Value::String(s) => s.eq_ignore_ascii_case("closed"),
    Value::Object(pair) => {
      pair.get("open").is_some_and(Value::is_string)
        && pair.get("close").is_some_and(Value::is_string)
    }
    _ => false,
  }
}

fn expected_shape(kind: FieldKind) -> &'static str {
  match kind {
    Text => "expected a string",
    Integer => "expected an integer",
    Float => "expected a number",
    Boolean => "expected a boolean",
    TextList => "expected a list of strings",
    Hours => "expected weekday → open/close pairs or \"CLOSED\"",
    Attributes => "expected an object or a list of {key, value} items",
  }
}
