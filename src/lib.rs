//! Reconciles scraped transcript rows against a curriculum plan.
//!
//! Rows are matched to plan courses by normalized name or alias, repeat
//! attempts collapse to one representative, leftovers become electives,
//! and user edits are staged and committed through [`EditSession`].

pub mod aliases;
pub mod config;
pub mod curriculum;
pub mod db;
pub mod error;
pub mod grades;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod overrides;
pub mod reconcile;
pub mod report;
pub mod scorer;
pub mod stats;
pub mod store;

pub use aliases::AliasTable;
pub use curriculum::Catalog;
pub use error::EngineError;
pub use models::{
    CourseStatus, CurriculumCourse, CurriculumPlan, CurriculumSemester, Field, MatchedEntry,
    ReconciliationResult, RowId, Stats, TranscriptRow, UnmappedEntry,
};
pub use normalize::normalize;
pub use overrides::EditSession;
pub use reconcile::{reconcile, Reconciler};
pub use scorer::pick_best;
pub use stats::aggregate;
pub use store::{JsonFileStore, MemoryStore, RowStore};
