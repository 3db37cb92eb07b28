//! # dossier-core
//!
//! Binding of validated report configs for the rendering layer.
//!
//! This crate provides:
//! - The two seam traits (`DocumentValidator`, `ValueResolver`)
//! - The `Binder` that validates a document and resolves every value
//! - The `RenderModel` it produces, with a SHA-256 fingerprint
//! - `StaticValues`, a table-backed resolver for files and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dossier_core::{Binder, StaticValues};
//!
//! let model = Binder::new(validator).bind(&doc, &StaticValues::default())?;
//! println!("{}", model.fingerprint()?);
//! ```

pub mod binder;
pub mod render;
pub mod resolver;
pub mod traits;

pub use binder::Binder;
pub use render::{Binding, RenderModel};
pub use resolver::StaticValues;
