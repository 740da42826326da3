//! Model listings: cursor-paginated browsing and multipart ingestion.
//!
//! - `domain`: submission form state, upload slots, response views
//! - `validation`: pure validation of a form state against a reference date
//! - `service`: query + transactional ingestion over the database and a `FileStore`

pub mod domain;
pub mod validation;
pub mod service;

pub use service::ListingService;
