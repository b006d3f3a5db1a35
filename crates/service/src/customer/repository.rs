use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{CustomerChanges, CustomerRecord, NewCustomer};
use super::errors::CustomerError;

/// Repository abstraction for customer persistence.
///
/// `insert` and `update` must report a duplicate email as
/// `CustomerError::Conflict` even when it slips past the service pre-check.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, CustomerError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerRecord>, CustomerError>;
    /// `page_idx` is 0-based.
    async fn list(&self, page_idx: u64, per_page: u64) -> Result<Vec<CustomerRecord>, CustomerError>;
    async fn insert(&self, new: NewCustomer) -> Result<CustomerRecord, CustomerError>;
    /// `None` when no row has this id.
    async fn update(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<CustomerRecord>, CustomerError>;
    /// Number of rows removed.
    async fn delete(&self, id: Uuid) -> Result<u64, CustomerError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    #[derive(Default)]
    pub struct MockCustomerRepository {
        rows: Mutex<Vec<CustomerRecord>>, // insertion order
    }

    impl MockCustomerRepository {
        pub fn len(&self) -> usize {
            self.rows.lock().map(|r| r.len()).unwrap_or_default()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Raw stored row, password hash included.
        pub fn stored(&self, email: &str) -> Option<CustomerRecord> {
            self.rows.lock().ok()?.iter().find(|r| r.email == email).cloned()
        }
    }

    fn poisoned<T>(_: T) -> CustomerError {
        CustomerError::Repository("mock repository lock poisoned".into())
    }

    #[async_trait]
    impl CustomerRepository for MockCustomerRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, CustomerError> {
            let rows = self.rows.lock().map_err(poisoned)?;
            Ok(rows.iter().find(|r| r.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerRecord>, CustomerError> {
            let rows = self.rows.lock().map_err(poisoned)?;
            Ok(rows.iter().find(|r| r.id == id).cloned())
        }

        async fn list(&self, page_idx: u64, per_page: u64) -> Result<Vec<CustomerRecord>, CustomerError> {
            let rows = self.rows.lock().map_err(poisoned)?;
            let skip = (page_idx * per_page) as usize;
            Ok(rows.iter().skip(skip).take(per_page as usize).cloned().collect())
        }

        async fn insert(&self, new: NewCustomer) -> Result<CustomerRecord, CustomerError> {
            let mut rows = self.rows.lock().map_err(poisoned)?;
            if rows.iter().any(|r| r.email == new.email) {
                return Err(CustomerError::Conflict);
            }
            let now = Utc::now().into();
            let rec = CustomerRecord {
                id: Uuid::new_v4(),
                name: new.name,
                email: new.email,
                password_hash: new.password_hash,
                balance: new.balance,
                created_at: now,
                updated_at: now,
            };
            rows.push(rec.clone());
            Ok(rec)
        }

        async fn update(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<CustomerRecord>, CustomerError> {
            let mut rows = self.rows.lock().map_err(poisoned)?;
            if let Some(email) = &changes.email {
                if rows.iter().any(|r| r.id != id && &r.email == email) {
                    return Err(CustomerError::Conflict);
                }
            }
            let Some(rec) = rows.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            if let Some(name) = changes.name { rec.name = name; }
            if let Some(email) = changes.email { rec.email = email; }
            if let Some(hash) = changes.password_hash { rec.password_hash = hash; }
            if let Some(balance) = changes.balance { rec.balance = balance; }
            rec.updated_at = Utc::now().into();
            Ok(Some(rec.clone()))
        }

        async fn delete(&self, id: Uuid) -> Result<u64, CustomerError> {
            let mut rows = self.rows.lock().map_err(poisoned)?;
            let before = rows.len();
            rows.retain(|r| r.id != id);
            Ok((before - rows.len()) as u64)
        }
    }
}
