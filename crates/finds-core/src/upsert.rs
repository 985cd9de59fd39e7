//! The upsert planner — locate-or-create, split, gate, merge, report.
//!
//! [`plan_upsert`] is pure: it takes the previously stored state and
//! produces the next one, plus a report of what actually changed. The
//! storage layer wraps it in a single transaction so both sub-records
//! commit or neither does.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
  Result,
  candidate::CandidateRecord,
  confidence::FieldConfidence,
  listing::{Listing, SourceInfo},
  merge,
  normalize::{normalise_phone, round_coord},
  registry::{EntityConfig, FieldSpec, entity_config, validate_candidate},
  taxonomy::map_categories,
  venue::Venue,
};

// ─── Results ─────────────────────────────────────────────────────────────────

/// Field names whose stored value actually changed during one upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeReport {
  pub listing_changes: Vec<String>,
  pub entity_changes:  Vec<String>,
}

impl ChangeReport {
  pub fn is_empty(&self) -> bool {
    self.listing_changes.is_empty() && self.entity_changes.is_empty()
  }
}

/// The next persisted state for one entity, plus what changed.
#[derive(Debug, Clone)]
pub struct UpsertPlan {
  pub listing: Listing,
  pub venue:   Venue,
  pub listing_created: bool,
  pub venue_created:   bool,
  pub report: ChangeReport,
}

// ─── Planner ─────────────────────────────────────────────────────────────────

/// Plan one upsert: merge `candidate` onto the stored state for
/// `(entity_name, entity_type)`.
///
/// Fails fast on an unknown entity type or a malformed candidate, before
/// the caller touches storage. Re-running the identical call against the
/// resulting state yields the same state and an empty change report.
pub fn plan_upsert(
  existing_listing: Option<Listing>,
  existing_venue: Option<Venue>,
  candidate: CandidateRecord,
  entity_name: &str,
  entity_type: &str,
  now: DateTime<Utc>,
) -> Result<UpsertPlan> {
  let config = entity_config(entity_type)?;
  validate_candidate(config, &candidate)?;

  let CandidateRecord {
    mut fields,
    field_confidence,
    source_info,
  } = candidate;

  normalise_fields(&mut fields);

  // Split into listing and entity-specific updates. Unknown fields and the
  // derived canonical list are dropped here; nulls were stripped at intake.
  let mut listing_updates = restrict_fields(&fields, config.listing_fields);
  listing_updates.remove("canonical_categories");
  let entity_updates = restrict_fields(&fields, config.entity_fields);

  let mut listing_conf = field_confidence.restrict(config.listing_field_names());
  let entity_conf = field_confidence.restrict(config.entity_field_names());

  // Identity comes from the caller, not the extraction: fully trusted.
  listing_updates.insert(
    "entity_name".to_string(),
    Value::String(entity_name.to_string()),
  );
  listing_updates.insert(
    "entity_type".to_string(),
    Value::String(entity_type.to_string()),
  );
  listing_conf.set("entity_name", 1.0);
  listing_conf.set("entity_type", 1.0);

  let (listing, listing_changes, listing_created) = upsert_listing(
    existing_listing,
    listing_updates,
    listing_conf,
    source_info,
    entity_name,
    entity_type,
    config,
    now,
  )?;

  let (venue, entity_changes, venue_created) = upsert_venue(
    existing_venue,
    entity_updates,
    entity_conf,
    &listing.listing_id,
    config,
  )?;

  Ok(UpsertPlan {
    listing,
    venue,
    listing_created,
    venue_created,
    report: ChangeReport {
      listing_changes,
      entity_changes,
    },
  })
}

// ─── Listing branch ──────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn upsert_listing(
  existing: Option<Listing>,
  mut updates: Map<String, Value>,
  mut conf: FieldConfidence,
  source_info: Option<SourceInfo>,
  entity_name: &str,
  entity_type: &str,
  config: &EntityConfig,
  now: DateTime<Utc>,
) -> Result<(Listing, Vec<String>, bool)> {
  match existing {
    None => {
      // Derived taxonomy: deterministic, hence fully trusted.
      let canonical = map_categories(&string_list(updates.get("categories")));
      updates.insert("canonical_categories".to_string(), string_array(canonical));
      conf.set("canonical_categories", 1.0);

      let mut listing = Listing::new(entity_name, entity_type, now);
      let changes: Vec<String> = updates.keys().cloned().collect();
      listing.apply_data_map(updates)?;

      listing.field_confidence = conf;
      for field in &changes {
        // Every populated field carries a score, defaulting to 0.0.
        listing.field_confidence.ensure(field);
      }

      if let Some(info) = source_info {
        listing.source_info = info;
      }

      Ok((listing, changes, true))
    }

    Some(mut listing) => {
      let mut map = listing.data_map(config.listing_fields)?;
      let mut stored_conf = listing.field_confidence.clone();

      let mut changes = merge::apply_updates(
        &mut map,
        &mut stored_conf,
        config.listing_fields,
        &updates,
        &conf,
      );

      // Recompute the canonical taxonomy over the full accumulated list,
      // so synonym-table updates propagate the next time the record is
      // touched.
      let canonical = map_categories(&string_list(map.get("categories")));
      if merge::apply_scalar_field(
        &mut map,
        &mut stored_conf,
        "canonical_categories",
        &string_array(canonical),
        1.0,
      ) {
        changes.push("canonical_categories".to_string());
      }

      listing.apply_data_map(map)?;
      listing.field_confidence = stored_conf;

      if let Some(info) = &source_info {
        listing.source_info.merge_from(info);
      }
      listing.updated_at = now;

      Ok((listing, changes, false))
    }
  }
}

// ─── Entity branch ───────────────────────────────────────────────────────────

fn upsert_venue(
  existing: Option<Venue>,
  updates: Map<String, Value>,
  conf: FieldConfidence,
  listing_id: &str,
  config: &EntityConfig,
) -> Result<(Venue, Vec<String>, bool)> {
  match existing {
    None => {
      let mut venue = Venue::new(listing_id);
      let changes: Vec<String> = updates.keys().cloned().collect();
      venue.apply_data_map(updates)?;

      venue.field_confidence = conf;
      for field in &changes {
        venue.field_confidence.ensure(field);
      }

      Ok((venue, changes, true))
    }

    Some(mut venue) => {
      let mut map = venue.data_map(config.entity_fields)?;
      let mut stored_conf = venue.field_confidence.clone();

      let changes = merge::apply_updates(
        &mut map,
        &mut stored_conf,
        config.entity_fields,
        &updates,
        &conf,
      );

      venue.apply_data_map(map)?;
      venue.field_confidence = stored_conf;

      Ok((venue, changes, false))
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Canonicalise phone and coordinates in place, before the gate runs, so
/// formatting differences never register as value changes.
fn normalise_fields(fields: &mut Map<String, Value>) {
  if let Some(phone) = fields.get("phone").and_then(Value::as_str) {
    let normalised = normalise_phone(phone);
    fields.insert("phone".to_string(), Value::String(normalised));
  }

  for key in ["latitude", "longitude"] {
    if let Some(coord) = fields.get(key).and_then(Value::as_f64)
      && let Some(number) = serde_json::Number::from_f64(round_coord(coord))
    {
      fields.insert(key.to_string(), Value::Number(number));
    }
  }
}

fn restrict_fields(fields: &Map<String, Value>, specs: &[FieldSpec]) -> Map<String, Value> {
  let mut out = Map::new();
  for spec in specs {
    if let Some(value) = fields.get(spec.name)
      && !value.is_null()
    {
      out.insert(spec.name.to_string(), value.clone());
    }
  }
  out
}

fn string_list(value: Option<&Value>) -> Vec<String> {
  value
    .and_then(Value::as_array)
    .map(|items| {
      items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default()
}

fn string_array(items: Vec<String>) -> Value {
  Value::Array(items.into_iter().map(Value::String).collect())
}
