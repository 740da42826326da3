//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and bearer-token resolution live here so the HTTP layer
//! only extracts credentials and maps errors.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
