//! # dossier-validate
//!
//! Whole-document validation for report configs.
//!
//! This crate provides [`engine::ReportValidator`], which implements the
//! [`dossier_core::traits::DocumentValidator`] trait. It validates documents
//! in two phases:
//!
//! 1. **Schema**: node-level parsing and checks, every error collected.
//! 2. **Document**: dangling `mainPage`/`pageLink`/`dataPointIDs`
//!    references, duplicate IDs and stored table rows.
//!
//! Behaviour is tuned by [`settings::ValidatorSettings`], loaded from TOML.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use dossier_validate::{ReportValidator, ValidatorSettings};
//!
//! let settings = ValidatorSettings::from_file(Path::new("dossier.toml"))?;
//! match ReportValidator::with_settings(settings).validate_str(&json) {
//!     Ok(doc) => println!("{} is valid", doc.name),
//!     Err(report) => eprintln!("{}", report.summary()),
//! }
//! ```

pub mod engine;
pub mod settings;

pub use engine::ReportValidator;
pub use settings::ValidatorSettings;
