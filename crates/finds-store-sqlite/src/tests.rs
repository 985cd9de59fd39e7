//! Integration tests for `SqliteStore` against an in-memory database.

use finds_core::{CandidateRecord, Error as CoreError, ListingStore};
use serde_json::{Value, json};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn candidate(value: Value) -> CandidateRecord {
  CandidateRecord::from_value(value).expect("valid candidate")
}

fn club_candidate() -> CandidateRecord {
  candidate(json!({
    "phone": "+44 131 000 0000",
    "city": "Edinburgh",
    "postcode": "EH6 6JB",
    "website_url": "https://a.com",
    "latitude": 55.953252,
    "longitude": -3.188267,
    "categories": ["Padel", "paddle tennis", "unknown_sport_xyz"],
    "opening_hours": {
      "monday": {"open": "07:00", "close": "22:00"},
      "sunday": "CLOSED",
    },
    "tennis": true,
    "tennis_total_courts": 6,
    "padel_total_courts": 4,
    "field_confidence": {
      "phone": 0.88,
      "city": 0.9,
      "postcode": 0.92,
      "website_url": 0.90,
      "latitude": 0.8,
      "longitude": 0.8,
      "categories": 0.85,
      "opening_hours": 0.7,
      "tennis": 0.95,
      "tennis_total_courts": 0.85,
      "padel_total_courts": 0.8,
    },
    "source_info": {"sources": ["https://club.example"], "note": "homepage"},
  }))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_upsert_creates_listing_and_venue() {
  let s = store().await;

  let outcome = s
    .upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  assert!(outcome.listing.listing_id.starts_with("VEN-"));
  assert_eq!(outcome.listing.slug, "test-club");
  assert_eq!(outcome.listing.phone.as_deref(), Some("+441310000000"));
  assert_eq!(
    outcome.listing.canonical_categories.as_deref(),
    Some(&["padel".to_string()][..])
  );
  assert_eq!(outcome.venue.listing_id, outcome.listing.listing_id);
  assert_eq!(outcome.venue.tennis_total_courts, Some(6));
  assert!(!outcome.report.listing_changes.is_empty());
  assert!(!outcome.report.entity_changes.is_empty());
}

#[tokio::test]
async fn stored_record_round_trips() {
  let s = store().await;

  let outcome = s
    .upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  let fetched = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .expect("record exists");

  assert_eq!(fetched.listing, outcome.listing);
  assert_eq!(fetched.venue, outcome.venue);

  let by_id = s
    .get_by_listing_id(outcome.listing.listing_id.clone())
    .await
    .unwrap()
    .expect("record exists by id");
  assert_eq!(by_id.listing, outcome.listing);
}

#[tokio::test]
async fn missing_record_returns_none() {
  let s = store().await;
  let result = s
    .get_by_identity("Nowhere Club".into(), "venue".into())
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn identical_reupsert_reports_no_changes() {
  let s = store().await;

  let first = s
    .upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();
  let second = s
    .upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  assert!(second.report.is_empty(), "report: {:?}", second.report);
  assert_eq!(second.listing.listing_id, first.listing.listing_id);
  assert_eq!(second.listing.phone, first.listing.phone);

  // Still exactly one record.
  assert_eq!(s.list_listings().await.unwrap().len(), 1);
}

// ─── Confidence gate, end to end ─────────────────────────────────────────────

#[tokio::test]
async fn reaffirmation_raises_stored_confidence() {
  let s = store().await;

  s.upsert(
    "Test Club".into(),
    "venue".into(),
    candidate(json!({
      "phone": "+44 131 000 0000",
      "field_confidence": {"phone": 0.88},
    })),
  )
  .await
  .unwrap();

  let outcome = s
    .upsert(
      "Test Club".into(),
      "venue".into(),
      candidate(json!({
        "phone": "+44 131 000 0000",
        "field_confidence": {"phone": 0.97},
      })),
    )
    .await
    .unwrap();

  assert!(!outcome.report.listing_changes.contains(&"phone".to_string()));
  assert_eq!(outcome.listing.field_confidence.get("phone"), 0.97);
}

#[tokio::test]
async fn threshold_overwrite_persists() {
  let s = store().await;

  s.upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  // website_url stored at 0.90; 0.70 hits the inclusive absolute bar.
  let outcome = s
    .upsert(
      "Test Club".into(),
      "venue".into(),
      candidate(json!({
        "website_url": "https://b.com",
        "field_confidence": {"website_url": 0.70},
      })),
    )
    .await
    .unwrap();

  assert!(
    outcome
      .report
      .listing_changes
      .contains(&"website_url".to_string())
  );

  let fetched = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.listing.website_url.as_deref(), Some("https://b.com"));
  assert_eq!(fetched.listing.field_confidence.get("website_url"), 0.70);
}

#[tokio::test]
async fn low_confidence_value_is_rejected_and_nothing_persists() {
  let s = store().await;

  s.upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  let outcome = s
    .upsert(
      "Test Club".into(),
      "venue".into(),
      candidate(json!({
        "city": "Glasgow",
        "field_confidence": {"city": 0.3},
      })),
    )
    .await
    .unwrap();

  assert!(!outcome.report.listing_changes.contains(&"city".to_string()));

  let fetched = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.listing.city.as_deref(), Some("Edinburgh"));
  assert_eq!(fetched.listing.field_confidence.get("city"), 0.9);
}

// ─── Composite merges, end to end ────────────────────────────────────────────

#[tokio::test]
async fn opening_hours_accumulate_across_sources() {
  let s = store().await;

  s.upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  s.upsert(
    "Test Club".into(),
    "venue".into(),
    candidate(json!({
      "opening_hours": {"saturday": {"open": "08:00", "close": "20:00"}},
      "field_confidence": {"opening_hours": 0.75},
    })),
  )
  .await
  .unwrap();

  let fetched = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();
  let hours = fetched.listing.opening_hours.unwrap();
  assert_eq!(hours.len(), 3);
  assert_eq!(hours["sunday"], finds_core::DayHours::Closed);
}

#[tokio::test]
async fn source_info_accumulates_across_sources() {
  let s = store().await;

  s.upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  s.upsert(
    "Test Club".into(),
    "venue".into(),
    candidate(json!({
      "source_info": {"sources": ["https://directory.example"]},
    })),
  )
  .await
  .unwrap();

  let fetched = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.listing.source_info.sources, vec![
    "https://club.example",
    "https://directory.example"
  ]);
  assert_eq!(fetched.listing.source_info.note.as_deref(), Some("homepage"));
}

// ─── Failure semantics ───────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_entity_type_fails_before_any_write() {
  let s = store().await;

  let err = s
    .upsert("Test Club".into(), "observatory".into(), club_candidate())
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Core(CoreError::UnknownEntityType(_))));
  assert!(s.list_listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_candidate_is_rejected_without_partial_writes() {
  let s = store().await;

  let err = s
    .upsert(
      "Test Club".into(),
      "venue".into(),
      candidate(json!({"tennis_total_courts": "six"})),
    )
    .await
    .unwrap_err();

  match err {
    Error::Core(core) => assert!(core.is_recoverable()),
    other => panic!("unexpected error: {other}"),
  }
  assert!(s.list_listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_candidate_does_not_corrupt_existing_state() {
  let s = store().await;

  s.upsert("Test Club".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  let before = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();

  let _ = s
    .upsert(
      "Test Club".into(),
      "venue".into(),
      candidate(json!({"opening_hours": {"monday": "sometimes"}})),
    )
    .await
    .unwrap_err();

  let after = s
    .get_by_identity("Test Club".into(), "venue".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after.listing, before.listing);
  assert_eq!(after.venue, before.venue);
}

// ─── Multiple identities ─────────────────────────────────────────────────────

#[tokio::test]
async fn distinct_identities_get_distinct_records() {
  let s = store().await;

  let a = s
    .upsert("Alpha Padel".into(), "venue".into(), club_candidate())
    .await
    .unwrap();
  let b = s
    .upsert("Beta Rackets".into(), "venue".into(), club_candidate())
    .await
    .unwrap();

  assert_ne!(a.listing.listing_id, b.listing.listing_id);
  assert_eq!(s.list_listings().await.unwrap().len(), 2);

  // Every listing has its venue sub-record: fetching by id never reports
  // a missing entity row.
  for id in [a.listing.listing_id, b.listing.listing_id] {
    assert!(s.get_by_listing_id(id).await.unwrap().is_some());
  }
}
