//! [`SqliteStore`] — the SQLite implementation of [`ListingStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use finds_core::{
  CandidateRecord, EntityTable, Listing, ListingStore, StoredRecord, UpsertOutcome, Venue,
  plan_upsert, registry,
};

use crate::{
  Error, Result,
  encode::{RawListing, RawVenue, encode_dt, encode_json, encode_json_opt},
  schema::SCHEMA,
};

/// Result type used inside `conn.call` closures.
type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

/// Wrap a store error so it can cross the `tokio_rusqlite` boundary.
fn boxed(err: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(err))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Finds venue store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// for one store are serialized through a single connection thread, so
/// upserts for the same identity never interleave (single-writer
/// discipline).
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ListingStore impl ───────────────────────────────────────────────────────

impl ListingStore for SqliteStore {
  type Error = Error;

  async fn upsert(
    &self,
    entity_name: String,
    entity_type: String,
    candidate: CandidateRecord,
  ) -> Result<UpsertOutcome> {
    // Fail fast, before any storage work: an unknown entity type or a
    // malformed candidate must not open a transaction.
    let config = registry::entity_config(&entity_type)?;
    registry::validate_candidate(config, &candidate)?;

    let plan = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing_listing = fetch_listing_by_identity(&tx, &entity_name, &entity_type)?;
        let existing_venue = match &existing_listing {
          Some(listing) => fetch_venue(&tx, &listing.listing_id)?,
          None => None,
        };

        let plan = plan_upsert(
          existing_listing,
          existing_venue,
          candidate,
          &entity_name,
          &entity_type,
          Utc::now(),
        )
        .map_err(|e| boxed(Error::Core(e)))?;

        if plan.listing_created {
          insert_listing(&tx, &plan.listing)?;
        } else {
          update_listing(&tx, &plan.listing)?;
        }
        match config.table {
          EntityTable::Venue => {
            if plan.venue_created {
              insert_venue(&tx, &plan.venue)?;
            } else {
              update_venue(&tx, &plan.venue)?;
            }
          }
        }

        // Anything failing above drops the transaction: full rollback,
        // prior state untouched, the identical call can be retried.
        tx.commit()?;
        Ok(plan)
      })
      .await?;

    tracing::debug!(
      listing_id = %plan.listing.listing_id,
      created = plan.listing_created,
      listing_changes = plan.report.listing_changes.len(),
      entity_changes = plan.report.entity_changes.len(),
      "upsert applied"
    );

    Ok(UpsertOutcome {
      listing: plan.listing,
      venue: plan.venue,
      report: plan.report,
    })
  }

  async fn get_by_identity(
    &self,
    entity_name: String,
    entity_type: String,
  ) -> Result<Option<StoredRecord>> {
    let record = self
      .conn
      .call(move |conn| {
        let Some(listing) = fetch_listing_by_identity(conn, &entity_name, &entity_type)? else {
          return Ok(None);
        };
        let venue = fetch_venue(conn, &listing.listing_id)?
          .ok_or_else(|| boxed(Error::MissingEntityRecord(listing.listing_id.clone())))?;
        Ok(Some(StoredRecord { listing, venue }))
      })
      .await?;
    Ok(record)
  }

  async fn get_by_listing_id(&self, listing_id: String) -> Result<Option<StoredRecord>> {
    let record = self
      .conn
      .call(move |conn| {
        let Some(listing) = fetch_listing_by_id(conn, &listing_id)? else {
          return Ok(None);
        };
        let venue = fetch_venue(conn, &listing.listing_id)?
          .ok_or_else(|| boxed(Error::MissingEntityRecord(listing.listing_id.clone())))?;
        Ok(Some(StoredRecord { listing, venue }))
      })
      .await?;
    Ok(record)
  }

  async fn list_listings(&self) -> Result<Vec<Listing>> {
    let listings = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{LISTING_SELECT} FROM listings ORDER BY entity_name"))?;
        let raws = stmt
          .query_map([], read_listing_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws
          .into_iter()
          .map(|raw| raw.into_listing().map_err(boxed))
          .collect::<CallResult<Vec<_>>>()
      })
      .await?;
    Ok(listings)
  }
}

// ─── Listing rows ────────────────────────────────────────────────────────────

const LISTING_SELECT: &str = "SELECT
    listing_id, slug, entity_name, entity_type,
    categories, canonical_categories, other_attributes,
    street_address, city, postcode, country, latitude, longitude,
    phone, email, website_url, instagram_url, facebook_url, twitter_url,
    linkedin_url, opening_hours, source_info, field_confidence,
    created_at, updated_at";

fn read_listing_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawListing> {
  Ok(RawListing {
    listing_id: row.get(0)?,
    slug: row.get(1)?,
    entity_name: row.get(2)?,
    entity_type: row.get(3)?,
    categories: row.get(4)?,
    canonical_categories: row.get(5)?,
    other_attributes: row.get(6)?,
    street_address: row.get(7)?,
    city: row.get(8)?,
    postcode: row.get(9)?,
    country: row.get(10)?,
    latitude: row.get(11)?,
    longitude: row.get(12)?,
    phone: row.get(13)?,
    email: row.get(14)?,
    website_url: row.get(15)?,
    instagram_url: row.get(16)?,
    facebook_url: row.get(17)?,
    twitter_url: row.get(18)?,
    linkedin_url: row.get(19)?,
    opening_hours: row.get(20)?,
    source_info: row.get(21)?,
    field_confidence: row.get(22)?,
    created_at: row.get(23)?,
    updated_at: row.get(24)?,
  })
}

fn fetch_listing_by_identity(
  conn: &rusqlite::Connection,
  entity_name: &str,
  entity_type: &str,
) -> CallResult<Option<Listing>> {
  let raw = conn
    .query_row(
      &format!("{LISTING_SELECT} FROM listings WHERE entity_name = ?1 AND entity_type = ?2"),
      rusqlite::params![entity_name, entity_type],
      read_listing_row,
    )
    .optional()?;
  raw.map(|r| r.into_listing().map_err(boxed)).transpose()
}

fn fetch_listing_by_id(
  conn: &rusqlite::Connection,
  listing_id: &str,
) -> CallResult<Option<Listing>> {
  let raw = conn
    .query_row(
      &format!("{LISTING_SELECT} FROM listings WHERE listing_id = ?1"),
      rusqlite::params![listing_id],
      read_listing_row,
    )
    .optional()?;
  raw.map(|r| r.into_listing().map_err(boxed)).transpose()
}

/// Column values for a listing INSERT or UPDATE, in schema order.
fn listing_params(listing: &Listing) -> CallResult<Vec<Box<dyn rusqlite::ToSql>>> {
  fn sql<T: rusqlite::ToSql + 'static>(value: T) -> Box<dyn rusqlite::ToSql> {
    Box::new(value)
  }

  Ok(vec![
    sql(listing.listing_id.clone()),
    sql(listing.slug.clone()),
    sql(listing.entity_name.clone()),
    sql(listing.entity_type.clone()),
    sql(encode_json_opt(listing.categories.as_ref()).map_err(boxed)?),
    sql(encode_json_opt(listing.canonical_categories.as_ref()).map_err(boxed)?),
    sql(encode_json_opt(listing.other_attributes.as_ref()).map_err(boxed)?),
    sql(listing.street_address.clone()),
    sql(listing.city.clone()),
    sql(listing.postcode.clone()),
    sql(listing.country.clone()),
    sql(listing.latitude),
    sql(listing.longitude),
    sql(listing.phone.clone()),
    sql(listing.email.clone()),
    sql(listing.website_url.clone()),
    sql(listing.instagram_url.clone()),
    sql(listing.facebook_url.clone()),
    sql(listing.twitter_url.clone()),
    sql(listing.linkedin_url.clone()),
    sql(encode_json_opt(listing.opening_hours.as_ref()).map_err(boxed)?),
    sql(encode_json(&listing.source_info).map_err(boxed)?),
    sql(encode_json(&listing.field_confidence).map_err(boxed)?),
    sql(encode_dt(listing.created_at)),
    sql(encode_dt(listing.updated_at)),
  ])
}

fn insert_listing(conn: &rusqlite::Connection, listing: &Listing) -> CallResult<()> {
  let params = listing_params(listing)?;
  conn.execute(
    "INSERT INTO listings (
       listing_id, slug, entity_name, entity_type,
       categories, canonical_categories, other_attributes,
       street_address, city, postcode, country, latitude, longitude,
       phone, email, website_url, instagram_url, facebook_url, twitter_url,
       linkedin_url, opening_hours, source_info, field_confidence,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
               ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
    rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
  )?;
  Ok(())
}

fn update_listing(conn: &rusqlite::Connection, listing: &Listing) -> CallResult<()> {
  let params = listing_params(listing)?;
  conn.execute(
    "UPDATE listings SET
       listing_id = ?1, slug = ?2, entity_name = ?3, entity_type = ?4,
       categories = ?5, canonical_categories = ?6, other_attributes = ?7,
       street_address = ?8, city = ?9, postcode = ?10, country = ?11,
       latitude = ?12, longitude = ?13, phone = ?14, email = ?15,
       website_url = ?16, instagram_url = ?17, facebook_url = ?18,
       twitter_url = ?19, linkedin_url = ?20, opening_hours = ?21,
       source_info = ?22, field_confidence = ?23,
       created_at = ?24, updated_at = ?25
     WHERE listing_id = ?1",
    rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
  )?;
  Ok(())
}

// ─── Venue rows ──────────────────────────────────────────────────────────────

const VENUE_SELECT: &str = "SELECT
    listing_id,
    tennis, tennis_total_courts, tennis_indoor_courts, tennis_floodlit_courts,
    padel, padel_total_courts, padel_covered_courts,
    pickleball, pickleball_total_courts,
    badminton, badminton_total_courts,
    squash, squash_total_courts, squash_glass_back_courts,
    table_tennis, table_tennis_total_tables,
    indoor_pool, outdoor_pool, indoor_pool_length_m, swimming_lessons,
    gym_available, classes_per_week,
    spa_available, sauna, steam_room,
    cafe_on_site, parking_on_site,
    google_rating, google_review_count,
    field_confidence";

fn read_venue_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawVenue> {
  Ok(RawVenue {
    listing_id: row.get(0)?,
    tennis: row.get(1)?,
    tennis_total_courts: row.get(2)?,
    tennis_indoor_courts: row.get(3)?,
    tennis_floodlit_courts: row.get(4)?,
    padel: row.get(5)?,
    padel_total_courts: row.get(6)?,
    padel_covered_courts: row.get(7)?,
    pickleball: row.get(8)?,
    pickleball_total_courts: row.get(9)?,
    badminton: row.get(10)?,
    badminton_total_courts: row.get(11)?,
    squash: row.get(12)?,
    squash_total_courts: row.get(13)?,
    squash_glass_back_courts: row.get(14)?,
    table_tennis: row.get(15)?,
    table_tennis_total_tables: row.get(16)?,
    indoor_pool: row.get(17)?,
    outdoor_pool: row.get(18)?,
    indoor_pool_length_m: row.get(19)?,
    swimming_lessons: row.get(20)?,
    gym_available: row.get(21)?,
    classes_per_week: row.get(22)?,
    spa_available: row.get(23)?,
    sauna: row.get(24)?,
    steam_room: row.get(25)?,
    cafe_on_site: row.get(26)?,
    parking_on_site: row.get(27)?,
    google_rating: row.get(28)?,
    google_review_count: row.get(29)?,
    field_confidence: row.get(30)?,
  })
}

fn fetch_venue(conn: &rusqlite::Connection, listing_id: &str) -> CallResult<Option<Venue>> {
  let raw = conn
    .query_row(
      &format!("{VENUE_SELECT} FROM venues WHERE listing_id = ?1"),
      rusqlite::params![listing_id],
      read_venue_row,
    )
    .optional()?;
  raw.map(|r| r.into_venue().map_err(boxed)).transpose()
}

/// Column values for a venue INSERT or UPDATE, in schema order.
fn venue_params(venue: &Venue) -> CallResult<Vec<Box<dyn rusqlite::ToSql>>> {
  fn sql<T: rusqlite::ToSql + 'static>(value: T) -> Box<dyn rusqlite::ToSql> {
    Box::new(value)
  }

  Ok(vec![
    sql(venue.listing_id.clone()),
    sql(venue.tennis),
    sql(venue.tennis_total_courts),
    sql(venue.tennis_indoor_courts),
    sql(venue.tennis_floodlit_courts),
    sql(venue.padel),
    sql(venue.padel_total_courts),
    sql(venue.padel_covered_courts),
    sql(venue.pickleball),
    sql(venue.pickleball_total_courts),
    sql(venue.badminton),
    sql(venue.badminton_total_courts),
    sql(venue.squash),
    sql(venue.squash_total_courts),
    sql(venue.squash_glass_back_courts),
    sql(venue.table_tennis),
    sql(venue.table_tennis_total_tables),
    sql(venue.indoor_pool),
    sql(venue.outdoor_pool),
    sql(venue.indoor_pool_length_m),
    sql(venue.swimming_lessons),
    sql(venue.gym_available),
    sql(venue.classes_per_week),
    sql(venue.spa_available),
    sql(venue.sauna),
    sql(venue.steam_room),
    sql(venue.cafe_on_site),
    sql(venue.parking_on_site),
    sql(venue.google_rating),
    sql(venue.google_review_count),
    sql(encode_json(&venue.field_confidence).map_err(boxed)?),
  ])
}

fn insert_venue(conn: &rusqlite::Connection, venue: &Venue) -> CallResult<()> {
  let params = venue_params(venue)?;
  conn.execute(
    "INSERT INTO venues (
       listing_id,
       tennis, tennis_total_courts, tennis_indoor_courts, tennis_floodlit_courts,
       padel, padel_total_courts, padel_covered_courts,
       pickleball, pickleball_total_courts,
       badminton, badminton_total_courts,
       squash, squash_total_courts, squash_glass_back_courts,
       table_tennis, table_tennis_total_tables,
       indoor_pool, outdoor_pool, indoor_pool_length_m, swimming_lessons,
       gym_available, classes_per_week,
       spa_available, sauna, steam_room,
       cafe_on_site, parking_on_site,
       google_rating, google_review_count,
       field_confidence
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
               ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
               ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31)",
    rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
  )?;
  Ok(())
}

fn update_venue(conn: &rusqlite::Connection, venue: &Venue) -> CallResult<()> {
  let params = venue_params(venue)?;
  conn.execute(
    "UPDATE venues SET
       listing_id = ?1,
       tennis = ?2, tennis_total_courts = ?3, tennis_indoor_courts = ?4,
       tennis_floodlit_courts = ?5,
       padel = ?6, padel_total_courts = ?7, padel_covered_courts = ?8,
       pickleball = ?9, pickleball_total_courts = ?10,
       badminton = ?11, badminton_total_courts = ?12,
       squash = ?13, squash_total_courts = ?14, squash_glass_back_courts = ?15,
       table_tennis = ?16, table_tennis_total_tables = ?17,
       indoor_pool = ?18, outdoor_pool = ?19, indoor_pool_length_m = ?20,
       swimming_lessons = ?21,
       gym_available = ?22, classes_per_week = ?23,
       spa_available = ?24, sauna = ?25, steam_room = ?26,
       cafe_on_site = ?27, parking_on_site = ?28,
       google_rating = ?29, google_review_count = ?30,
       field_confidence = ?31
     WHERE listing_id = ?1",
    rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
  )?;
  Ok(())
}
