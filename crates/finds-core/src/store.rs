//! The [`ListingStore`] trait and upsert result types.
//!
//! The trait is implemented by storage backends (e.g.
//! `finds-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use serde::Serialize;

use crate::{candidate::CandidateRecord, listing::Listing, upsert::ChangeReport, venue::Venue};

/// A listing together with its entity-specific sub-record. One exists iff
/// the other does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
  pub listing: Listing,
  pub venue:   Venue,
}

/// What an upsert persisted, plus the fields it actually changed.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertOutcome {
  pub listing: Listing,
  pub venue:   Venue,
  pub report:  ChangeReport,
}

/// Abstraction over a venue-record store backend.
///
/// `upsert` must run the whole read-modify-write cycle for both sub-records
/// as one transaction: a reader can never observe a Listing without its
/// entity sub-record, and a failed call leaves the prior state untouched so
/// the identical call can safely be retried.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait ListingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Merge one candidate into the record identified by
  /// `(entity_name, entity_type)`, creating the record if absent.
  fn upsert(
    &self,
    entity_name: String,
    entity_type: String,
    candidate: CandidateRecord,
  ) -> impl Future<Output = Result<UpsertOutcome, Self::Error>> + Send + '_;

  /// Fetch a record by identity. `None` if it does not exist.
  fn get_by_identity(
    &self,
    entity_name: String,
    entity_type: String,
  ) -> impl Future<Output = Result<Option<StoredRecord>, Self::Error>> + Send + '_;

  /// Fetch a record by its immutable listing id.
  fn get_by_listing_id(
    &self,
    listing_id: String,
  ) -> impl Future<Output = Result<Option<StoredRecord>, Self::Error>> + Send + '_;

  /// All listings, without their entity sub-records.
  fn list_listings(&self) -> impl Future<Output = Result<Vec<Listing>, Self::Error>> + Send + '_;
}
