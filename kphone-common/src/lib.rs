//! # KeplerPhone Common Library
//!
//! Shared code for the KeplerPhone client including:
//! - Catalog and scale entry types
//! - Selection state and source mode transitions
//! - Link building (plot image, playback, canonical, share)
//! - Configuration loading

pub mod catalog;
pub mod config;
pub mod error;
pub mod links;
pub mod selection;

pub use catalog::{CatalogEntry, SelectOption};
pub use error::{Error, Result};
pub use links::ShareState;
pub use selection::{ControlEdit, Controls, PersistedSelection, SelectionState, SourceMode};
