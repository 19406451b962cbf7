//! gtd-core: Core library for the gtd task organizer
//!
//! Provides the data model, the JSON-file store, the consistency rules that
//! keep items and projects coherent, derived review lists, and full-data
//! export/import.

mod de;

pub mod config;
pub mod error;
pub mod id;
pub mod item;
pub mod project;
pub mod rules;
pub mod seed;
pub mod snapshot;
pub mod store;
pub mod timestamp;
pub mod views;

pub use config::Config;
pub use error::{Entity, Error};
pub use id::IdCounter;
pub use item::{EnergyLevel, Item, ItemPatch, ItemStatus, NewItem};
pub use project::{NewProject, Project, ProjectPatch, ProjectStatus};
pub use rules::CascadeReport;
pub use snapshot::{ImportReport, Snapshot};
pub use store::{Data, Store};
pub use views::ReviewSummary;

/// Result type for gtd operations
pub type Result<T> = std::result::Result<T, Error>;
