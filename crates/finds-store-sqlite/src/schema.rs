//! SQL schema for the Finds SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per physical entity; identity is (entity_name, entity_type).
-- listing_id is assigned at creation and never changes.
CREATE TABLE IF NOT EXISTS listings (
    listing_id           TEXT PRIMARY KEY,
    slug                 TEXT NOT NULL UNIQUE,
    entity_name          TEXT NOT NULL,
    entity_type          TEXT NOT NULL,
    categories           TEXT,            -- JSON array, raw extracted labels
    canonical_categories TEXT,            -- JSON array, controlled taxonomy
    other_attributes     TEXT,            -- JSON object or [{key, value}] list
    street_address       TEXT,
    city                 TEXT,
    postcode             TEXT,
    country              TEXT,
    latitude             REAL,
    longitude            REAL,
    phone                TEXT,
    email                TEXT,
    website_url          TEXT,
    instagram_url        TEXT,
    facebook_url         TEXT,
    twitter_url          TEXT,
    linkedin_url         TEXT,
    opening_hours        TEXT,            -- JSON weekday map
    source_info          TEXT NOT NULL DEFAULT '{\"sources\":[]}',
    field_confidence     TEXT NOT NULL DEFAULT '{}',
    created_at           TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at           TEXT NOT NULL,
    UNIQUE (entity_name, entity_type)
);

-- Venue-specific sub-record. Lifecycle is subordinate to listings:
-- written in the same transaction, removed by cascade.
CREATE TABLE IF NOT EXISTS venues (
    listing_id                TEXT PRIMARY KEY
                              REFERENCES listings(listing_id) ON DELETE CASCADE,
    tennis                    INTEGER,
    tennis_total_courts       INTEGER,
    tennis_indoor_courts      INTEGER,
    tennis_floodlit_courts    INTEGER,
    padel                     INTEGER,
    padel_total_courts        INTEGER,
    padel_covered_courts      INTEGER,
    pickleball                INTEGER,
    pickleball_total_courts   INTEGER,
    badminton                 INTEGER,
    badminton_total_courts    INTEGER,
    squash                    INTEGER,
    squash_total_courts       INTEGER,
    squash_glass_back_courts  INTEGER,
    table_tennis              INTEGER,
    table_tennis_total_tables INTEGER,
    indoor_pool               INTEGER,
    outdoor_pool              INTEGER,
    indoor_pool_length_m      INTEGER,
    swimming_lessons          INTEGER,
    gym_available             INTEGER,
    classes_per_week          INTEGER,
    spa_available             INTEGER,
    sauna                     INTEGER,
    steam_room                INTEGER,
    cafe_on_site              INTEGER,
    parking_on_site           INTEGER,
    google_rating             REAL,
    google_review_count       INTEGER,
    field_confidence          TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS listings_city_idx     ON listings(city);
CREATE INDEX IF NOT EXISTS listings_postcode_idx ON listings(postcode);

PRAGMA user_version = 1;
";
