//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access and HTTP transport.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod runtime;
pub mod pagination;
pub mod storage;
pub mod listing;
#[cfg(test)]
pub mod test_support;
