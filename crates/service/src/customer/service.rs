use std::sync::Arc;

use common::types::Message;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{
    CustomerChanges, CustomerView, LoginInput, LoginOutput, NewCustomer, RegisterInput, UpdateCustomerInput,
};
use super::errors::CustomerError;
use super::password::{PasswordAlgorithm, PasswordHasher};
use super::repository::CustomerRepository;
use super::token::{Claims, TokenIssuer};
use super::validation::{self, normalize_email};
use crate::pagination::Pagination;

/// Customer service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
    pub password_algorithm: PasswordAlgorithm,
}

/// Customer business service independent of web framework
pub struct CustomerService<R: CustomerRepository + ?Sized> {
    repo: Arc<R>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl<R: CustomerRepository + ?Sized> CustomerService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Result<Self, CustomerError> {
        let tokens = TokenIssuer::new(cfg.jwt_secret.as_bytes(), cfg.token_ttl_secs)?;
        let hasher = PasswordHasher::new(cfg.password_algorithm, cfg.bcrypt_cost);
        hasher.warm_up()?;
        Ok(Self { repo, hasher, tokens })
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new customer with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::customer::{service::{AuthConfig, CustomerService}, repository::mock::MockCustomerRepository};
    /// use service::customer::{domain::RegisterInput, password::PasswordAlgorithm};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockCustomerRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), token_ttl_secs: 3600, bcrypt_cost: 4, password_algorithm: PasswordAlgorithm::Bcrypt };
    /// let svc = CustomerService::new(repo, cfg).unwrap();
    /// let input = RegisterInput { name: "Test".into(), email: "user@example.com".into(), password: "secret1".into(), balance: None };
    /// let customer = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(customer.email, "user@example.com");
    /// assert_eq!(customer.balance, 0.0);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<CustomerView, CustomerError> {
        let view = self.insert_new(input).await?;
        info!(customer_id = %view.id, email = %view.email, "customer_registered");
        Ok(view)
    }

    /// Administrative creation; same rules as registration.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: RegisterInput) -> Result<CustomerView, CustomerError> {
        let view = self.insert_new(input).await?;
        info!(customer_id = %view.id, email = %view.email, "customer_created");
        Ok(view)
    }

    async fn insert_new(&self, input: RegisterInput) -> Result<CustomerView, CustomerError> {
        validation::validate_register(&input)?;
        let email = normalize_email(&input.email);
        if self.repo.find_by_email(&email).await?.is_some() {
            debug!(%email, "email already registered");
            return Err(CustomerError::Conflict);
        }

        let password_hash = self.hasher.hash_blocking(input.password).await?;
        let created = self
            .repo
            .insert(NewCustomer {
                name: input.name.trim().to_string(),
                email,
                password_hash,
                balance: input.balance.unwrap_or(0.0),
            })
            .await?;
        Ok(created.into())
    }

    /// Authenticate and issue a signed token.
    ///
    /// Unknown email and wrong password fail with the same error after the
    /// same amount of hashing work.
    ///
    /// # Examples
    /// ```
    /// use service::customer::{service::{AuthConfig, CustomerService}, repository::mock::MockCustomerRepository};
    /// use service::customer::{domain::{RegisterInput, LoginInput}, password::PasswordAlgorithm};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockCustomerRepository::default());
    /// let cfg = AuthConfig { jwt_secret: "secret".into(), token_ttl_secs: 3600, bcrypt_cost: 4, password_algorithm: PasswordAlgorithm::Bcrypt };
    /// let svc = CustomerService::new(repo, cfg).unwrap();
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { name: "N".into(), email: "a@b.com".into(), password: "secret1".into(), balance: None }));
    /// let out = tokio_test::block_on(svc.login(LoginInput { email: "a@b.com".into(), password: "secret1".into() })).unwrap();
    /// assert!(!out.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, CustomerError> {
        validation::validate_login(&input)?;
        let email = normalize_email(&input.email);

        let Some(customer) = self.repo.find_by_email(&email).await? else {
            self.hasher.verify_dummy_blocking(input.password).await?;
            return Err(CustomerError::Unauthorized);
        };
        if !self.hasher.verify_blocking(input.password, customer.password_hash).await? {
            return Err(CustomerError::Unauthorized);
        }

        let token = self.tokens.issue(customer.id, &customer.email)?;
        info!(customer_id = %customer.id, "customer_logged_in");
        Ok(LoginOutput { token })
    }

    /// Decode a token issued by `login`.
    pub fn verify_token(&self, token: &str) -> Result<Claims, CustomerError> {
        self.tokens.verify(token)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<CustomerView, CustomerError> {
        self.repo.find_by_id(id).await?.map(CustomerView::from).ok_or(CustomerError::NotFound)
    }

    pub async fn find_all(&self, page: Pagination) -> Result<Vec<CustomerView>, CustomerError> {
        let (page_idx, per_page) = page.normalize();
        let rows = self.repo.list(page_idx, per_page).await?;
        Ok(rows.into_iter().map(CustomerView::from).collect())
    }

    /// Apply only the supplied fields; a new password is hashed first.
    #[instrument(skip(self, input), fields(customer_id = %id))]
    pub async fn update(&self, id: Uuid, input: UpdateCustomerInput) -> Result<CustomerView, CustomerError> {
        validation::validate_update(&input)?;
        let email = input.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if let Some(owner) = self.repo.find_by_email(email).await? {
                if owner.id != id {
                    return Err(CustomerError::Conflict);
                }
            }
        }
        let password_hash = match input.password {
            Some(p) => Some(self.hasher.hash_blocking(p).await?),
            None => None,
        };
        let changes = CustomerChanges {
            name: input.name.map(|n| n.trim().to_string()),
            email,
            password_hash,
            balance: input.balance,
        };
        let updated = self.repo.update(id, changes).await?.ok_or(CustomerError::NotFound)?;
        info!(customer_id = %updated.id, "customer_updated");
        Ok(updated.into())
    }

    /// Delete exactly one customer.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn remove(&self, id: Uuid) -> Result<Message, CustomerError> {
        if self.repo.delete(id).await? == 0 {
            return Err(CustomerError::NotFound);
        }
        info!(customer_id = %id, "customer_deleted");
        Ok(Message::new("Customer deleted successfully."))
    }
}
