//! skillspec - validate skill specifications and keep generated docs in sync.
//!
//! The library is organized around two subsystems:
//!
//! - [`validate`]: a layered validation pipeline (schema, quality, coverage,
//!   consistency, compliance) aggregated by [`validate::ValidationEngine`]
//!   into one [`validate::ValidationResult`].
//! - [`preserve`]: a marker-based document reconciler that merges freshly
//!   rendered content with a prior document without losing manual edits.
//!
//! [`spec`] holds the typed specification model and the decision-rule
//! normalizer every layer consumes; [`render`] produces the generated
//! document the reconciler and the consistency layer compare against.

pub mod cli;
pub mod error;
pub mod i18n;
pub mod preserve;
pub mod render;
pub mod spec;
pub mod validate;

pub use error::{Result, SkillspecError};
