//! Core types and the merge/upsert engine for the Finds venue store.
//!
//! Records are assembled from many untrusted, LLM-mediated extractions.
//! Each incoming candidate carries per-field confidence scores; the merge
//! engine decides, field by field, whether a new value may replace what is
//! already on file. This crate is deliberately free of HTTP and database
//! dependencies — storage backends implement [`store::ListingStore`].

pub mod candidate;
pub mod confidence;
pub mod error;
pub mod ident;
pub mod listing;
pub mod merge;
pub mod normalize;
pub mod registry;
pub mod store;
pub mod taxonomy;
pub mod upsert;
pub mod venue;

pub use candidate::CandidateRecord;
pub use confidence::FieldConfidence;
pub use error::{Error, Result};
pub use listing::{DayHours, Listing, SourceInfo};
pub use merge::CHANGE_MIN_CONF;
pub use registry::{EntityConfig, EntityTable, FieldKind, FieldSpec, entity_config};
pub use store::{ListingStore, StoredRecord, UpsertOutcome};
pub use upsert::{ChangeReport, UpsertPlan, plan_upsert};
pub use venue::Venue;
