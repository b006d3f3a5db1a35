//! Input checks run before any service logic.
//!
//! Every check is evaluated so a caller sees all violated fields at once.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::domain::{LoginInput, RegisterInput, UpdateCustomerInput};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Trim and lowercase so lookups and the unique index agree.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub fn valid_email(email_normalized: &str) -> bool {
    EMAIL_RE.is_match(email_normalized)
}

fn check_name(errs: &mut ValidationErrors, name: &str) {
    if name.trim().is_empty() {
        errs.push("name", "must not be empty");
    }
}

fn check_email(errs: &mut ValidationErrors, email: &str) {
    let email = normalize_email(email);
    if email.is_empty() {
        errs.push("email", "must not be empty");
    } else if !valid_email(&email) {
        errs.push("email", "must be a valid email address");
    }
}

fn check_password(errs: &mut ValidationErrors, password: &str) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errs.push("password", format!("must be at least {MIN_PASSWORD_LEN} characters"));
    }
}

fn check_balance(errs: &mut ValidationErrors, balance: f64) {
    if !balance.is_finite() {
        errs.push("balance", "must be a finite number");
    } else if balance < 0.0 {
        errs.push("balance", "must not be negative");
    }
}

pub fn validate_register(input: &RegisterInput) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    check_name(&mut errs, &input.name);
    check_email(&mut errs, &input.email);
    check_password(&mut errs, &input.password);
    if let Some(b) = input.balance { check_balance(&mut errs, b); }
    errs.into_result()
}

pub fn validate_login(input: &LoginInput) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    check_email(&mut errs, &input.email);
    if input.password.is_empty() {
        errs.push("password", "must not be empty");
    }
    errs.into_result()
}

/// Only the supplied fields are checked.
pub fn validate_update(input: &UpdateCustomerInput) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    if let Some(name) = &input.name { check_name(&mut errs, name); }
    if let Some(email) = &input.email { check_email(&mut errs, email); }
    if let Some(password) = &input.password { check_password(&mut errs, password); }
    if let Some(b) = input.balance { check_balance(&mut errs, b); }
    errs.into_result()
}
