use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use common::types::Message;
use service::customer::domain::{CustomerView, RegisterInput, UpdateCustomerInput};
use service::pagination::Pagination;

use super::auth::ServerState;
use crate::errors::JsonApiError;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default 1)
    pub page: Option<u32>,
    /// Page size, clamped to 1..=100 (default 20)
    pub per_page: Option<u32>,
}

#[utoipa::path(
    get, path = "/customers", tag = "customers",
    params(ListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customers", body = [crate::openapi::CustomerResponse]),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<CustomerView>>, JsonApiError> {
    let Query(q) = query?;
    let page = Pagination::from_query(q.page, q.per_page);
    let rows = state.customers.find_all(page).await?;
    info!(count = rows.len(), page = page.page, "list customers");
    Ok(Json(rows))
}

#[utoipa::path(
    post, path = "/customers", tag = "customers",
    request_body = crate::openapi::RegisterRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = crate::openapi::CustomerResponse),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Conflict", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerView>), JsonApiError> {
    let Json(input) = payload?;
    let view = state.customers.create(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get, path = "/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Customer", body = crate::openapi::CustomerResponse),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CustomerView>, JsonApiError> {
    let Path(id) = id?;
    Ok(Json(state.customers.find_one(id).await?))
}

#[utoipa::path(
    patch, path = "/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = crate::openapi::UpdateCustomerRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::CustomerResponse),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Conflict", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateCustomerInput>, JsonRejection>,
) -> Result<Json<CustomerView>, JsonApiError> {
    let Path(id) = id?;
    let Json(input) = payload?;
    Ok(Json(state.customers.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/customers/{id}", tag = "customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageResponse),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Message>, JsonApiError> {
    let Path(id) = id?;
    Ok(Json(state.customers.remove(id).await?))
}
