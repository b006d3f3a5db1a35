//! Service layer providing customer registration, login and CRUD on top of models.
//! - Separates business logic from data access.
//! - Reuses entity definitions in the `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod customer;
pub mod pagination;
#[cfg(test)]
pub mod test_support;
