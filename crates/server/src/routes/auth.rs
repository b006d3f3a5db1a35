use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use service::customer::domain::{CustomerView, LoginInput, LoginOutput, RegisterInput};
use service::customer::repository::CustomerRepository;
use service::customer::CustomerService;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

pub type SharedCustomerService = Arc<CustomerService<dyn CustomerRepository>>;

#[derive(Clone)]
pub struct ServerState {
    pub customers: SharedCustomerService,
    /// Mark the auth cookie `Secure` (enable behind TLS).
    pub secure_cookie: bool,
}

#[utoipa::path(
    post, path = "/auth/register", tag = "auth",
    request_body = crate::openapi::RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = crate::openapi::CustomerResponse),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorResponse),
        (status = 409, description = "Conflict", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CustomerView>), JsonApiError> {
    let Json(input) = payload?;
    let view = state.customers.register(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    post, path = "/auth/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged In", body = crate::openapi::TokenResponse),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let Json(input) = payload?;
    let out = state.customers.login(input).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, out.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.secure_cookie);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(out)))
}

/// Pull the token from `Authorization: Bearer <token>`, falling back to the
/// `auth_token` cookie.
fn extract_token(req: &Request) -> Result<String, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let value = h.to_str().map_err(|_| JsonApiError::unauthorized("malformed Authorization header"))?;
        return value
            .strip_prefix("Bearer ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| JsonApiError::unauthorized("expected Authorization: Bearer <token>"));
    }
    CookieJar::from_headers(req.headers())
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| JsonApiError::unauthorized("missing bearer token"))
}

/// Reject requests without a valid, unexpired token. The decoded claims are
/// stored as a request extension for downstream handlers.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let token = extract_token(&req).inspect_err(|_| warn!(%path, "request without usable token"))?;
    let claims = state.customers.verify_token(&token).map_err(|e| {
        warn!(%path, err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired token")
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
