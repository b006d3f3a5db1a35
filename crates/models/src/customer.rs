use sea_orm::{entity::prelude::*, ConnectionTrait, Set, QueryOrder, PaginatorTrait};
use uuid::Uuid;
use chrono::Utc;

use crate::errors;

/// Persisted customer row. `password` always holds a salted hash.
///
/// Not `Serialize`; outbound representations live in the service layer.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    #[sea_orm(column_type = "Double")]
    pub balance: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Field-level changes for a partial update. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub balance: Option<f64>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.balance.is_none()
    }
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    name: &str,
    email: &str,
    password_hash: String,
    balance: f64,
) -> Result<Model, errors::ModelError> {
    if password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password: Set(password_hash),
        balance: Set(balance),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}

/// One page of customers in creation order. `page_idx` is 0-based.
pub async fn list_page<C: ConnectionTrait>(db: &C, page_idx: u64, per_page: u64) -> Result<Vec<Model>, errors::ModelError> {
    let rows = Entity::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await?;
    Ok(rows)
}

/// Load the row, merge the supplied fields and save it back.
/// Returns `None` when no row has this id.
pub async fn apply_patch<C: ConnectionTrait>(db: &C, id: Uuid, patch: Patch) -> Result<Option<Model>, errors::ModelError> {
    let Some(existing) = Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    if patch.is_empty() {
        return Ok(Some(existing));
    }
    let mut am: ActiveModel = existing.into();
    if let Some(name) = patch.name { am.name = Set(name); }
    if let Some(email) = patch.email { am.email = Set(email); }
    if let Some(password) = patch.password { am.password = Set(password); }
    if let Some(balance) = patch.balance { am.balance = Set(balance); }
    am.updated_at = Set(Utc::now().into());
    match am.update(db).await {
        Ok(m) => Ok(Some(m)),
        // deleted after the preload
        Err(DbErr::RecordNotUpdated) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete by id, returning the number of rows removed.
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, errors::ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected)
}
