//! Customer module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and profile CRUD live here; hashing, token signing and
//! input validation are split into their own files.

pub mod domain;
pub mod errors;
pub mod validation;
pub mod password;
pub mod token;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::CustomerService;
