//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Composite fields
//! (categories, opening hours, provenance, confidence) are stored as
//! compact JSON.

use chrono::{DateTime, Utc};
use finds_core::{Listing, Venue};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
  value.map(encode_json).transpose()
}

pub fn decode_json_opt<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>> {
  s.map(decode_json).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw column values read directly from a `listings` row.
pub struct RawListing {
  pub listing_id:           String,
  pub slug:                 String,
  pub entity_name:          String,
  pub entity_type:          String,
  pub categories:           Option<String>,
  pub canonical_categories: Option<String>,
  pub other_attributes:     Option<String>,
  pub street_address:       Option<String>,
  pub city:                 Option<String>,
  pub postcode:             Option<String>,
  pub country:              Option<String>,
  pub latitude:             Option<f64>,
  pub longitude:            Option<f64>,
  pub phone:                Option<String>,
  pub email:                Option<String>,
  pub website_url:          Option<String>,
  pub instagram_url:        Option<String>,
  pub facebook_url:         Option<String>,
  pub twitter_url:          Option<String>,
  pub linkedin_url:         Option<String>,
  pub opening_hours:        Option<String>,
  pub source_info:          String,
  pub field_confidence:     String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawListing {
  pub fn into_listing(self) -> Result<Listing> {
    Ok(Listing {
      listing_id: self.listing_id,
      slug: self.slug,
      entity_name: self.entity_name,
      entity_type: self.entity_type,
      categories: decode_json_opt(self.categories.as_deref())?,
      canonical_categories: decode_json_opt(self.canonical_categories.as_deref())?,
      other_attributes: decode_json_opt(self.other_attributes.as_deref())?,
      street_address: self.street_address,
      city: self.city,
      postcode: self.postcode,
      country: self.country,
      latitude: self.latitude,
      longitude: self.longitude,
      phone: self.phone,
      email: self.email,
      website_url: self.website_url,
      instagram_url: self.instagram_url,
      facebook_url: self.facebook_url,
      twitter_url: self.twitter_url,
      linkedin_url: self.linkedin_url,
      opening_hours: decode_json_opt(self.opening_hours.as_deref())?,
      source_info: decode_json(&self.source_info)?,
      field_confidence: decode_json(&self.field_confidence)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw column values read directly from a `venues` row. Numeric and boolean
/// columns come out typed; only the confidence map needs decoding.
pub struct RawVenue {
  pub listing_id:                String,
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
  pub indoor_pool:               Option<bool>,
  pub outdoor_pool:              Option<bool>,
  pub indoor_pool_length_m:      Option<i64>,
  pub swimming_lessons:          Option<bool>,
  pub gym_available:             Option<bool>,
  pub classes_per_week:          Option<i64>,
  pub spa_available:             Option<bool>,
  pub sauna:                     Option<bool>,
  pub steam_room:                Option<bool>,
  pub cafe_on_site:              Option<bool>,
  pub parking_on_site:           Option<bool>,
  pub google_rating:             Option<f64>,
  pub google_review_count:       Option<i64>,
  pub field_confidence:          String,
}

impl RawVenue {
  pub fn into_venue(self) -> Result<Venue> {
    Ok(Venue {
      listing_id: self.listing_id,
      tennis: self.tennis,
      tennis_total_courts: self.tennis_total_courts,
      tennis_indoor_courts: self.tennis_indoor_courts,
      tennis_floodlit_courts: self.tennis_floodlit_courts,
      padel: self.padel,
      padel_total_courts: self.padel_total_courts,
      padel_covered_courts: self.padel_covered_courts,
      pickleball: self.pickleball,
      pickleball_total_courts: self.pickleball_total_courts,
      badminton: self.badminton,
      badminton_total_courts: self.badminton_total_courts,
      squash: self.squash,
      squash_total_courts: self.squash_total_courts,
      squash_glass_back_courts: self.squash_glass_back_courts,
      table_tennis: self.table_tennis,
      table_tennis_total_tables: self.table_tennis_total_tables,
      indoor_pool: self.indoor_pool,
      outdoor_pool: self.outdoor_pool,
      indoor_pool_length_m: self.indoor_pool_length_m,
      swimming_lessons: self.swimming_lessons,
      gym_available: self.gym_available,
      classes_per_week: self.classes_per_week,
      spa_available: self.spa_available,
      sauna: self.sauna,
      steam_room: self.steam_room,
      cafe_on_site: self.cafe_on_site,
      parking_on_site: self.parking_on_site,
      google_rating: self.google_rating,
      google_review_count: self.google_review_count,
      field_confidence: decode_json(&self.field_confidence)?,
    })
  }
}
