//! Catalog provider boundary.
//!
//! Products are owned by a headless CMS; the core reads the catalog once at
//! startup and applies a best-effort stock write-back after checkout. The
//! provider's query language is not modeled here beyond the two calls the
//! core needs.

mod client;
mod types;

pub use client::CatalogClient;
pub use types::Product;
