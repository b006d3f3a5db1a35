use sea_orm::DatabaseConnection;
use uuid::Uuid;

use models::customer;

use crate::customer::domain::{CustomerChanges, CustomerRecord, NewCustomer};
use crate::customer::errors::CustomerError;
use crate::customer::repository::CustomerRepository;

pub struct SeaOrmCustomerRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_record(m: customer::Model) -> CustomerRecord {
    CustomerRecord {
        id: m.id,
        name: m.name,
        email: m.email,
        password_hash: m.password,
        balance: m.balance,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

#[async_trait::async_trait]
impl CustomerRepository for SeaOrmCustomerRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerRecord>, CustomerError> {
        Ok(customer::find_by_email(&self.db, email).await?.map(to_record))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CustomerRecord>, CustomerError> {
        Ok(customer::find_by_id(&self.db, id).await?.map(to_record))
    }

    async fn list(&self, page_idx: u64, per_page: u64) -> Result<Vec<CustomerRecord>, CustomerError> {
        let rows = customer::list_page(&self.db, page_idx, per_page).await?;
        Ok(rows.into_iter().map(to_record).collect())
    }

    async fn insert(&self, new: NewCustomer) -> Result<CustomerRecord, CustomerError> {
        let created = customer::create(&self.db, &new.name, &new.email, new.password_hash, new.balance).await?;
        Ok(to_record(created))
    }

    async fn update(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<CustomerRecord>, CustomerError> {
        let patch = customer::Patch {
            name: changes.name,
            email: changes.email,
            password: changes.password_hash,
            balance: changes.balance,
        };
        Ok(customer::apply_patch(&self.db, id, patch).await?.map(to_record))
    }

    async fn delete(&self, id: Uuid) -> Result<u64, CustomerError> {
        Ok(customer::delete(&self.db, id).await?)
    }
}
