//! Plexsync-Common: Shared identifiers, item kinds, and small helpers.
//!
//! This crate provides functionality used across plexsync:
//!
//! - **Typed IDs**: String newtypes for rating keys, section keys, machine
//!   identifiers, and provider GUIDs
//! - **Core Types**: Enums for section kinds, item kinds, and artwork kinds
//! - **Resolution**: Mapping of resolution labels to pixel heights and SD/HD
//!   classification
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use plexsync_common::{ProviderGuid, SectionKind};
//! use plexsync_common::resolution::{classify, Definition};
//!
//! let guid = ProviderGuid::new("IMDB://tt0111161");
//! assert_eq!(guid.as_str(), "imdb://tt0111161");
//! assert!(ProviderGuid::parse("  ").is_err());
//!
//! assert!(SectionKind::Show.is_video());
//! assert_eq!(classify(480, 720), Definition::Sd);
//! ```

pub mod error;
pub mod ids;
pub mod resolution;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
