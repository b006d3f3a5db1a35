#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn test_config() -> Option<DatabaseConfig> {
    let url = models::db::DATABASE_URL.clone()?;
    Some(DatabaseConfig {
        url,
        max_connections: 10,
        min_connections: 1,
        connect_timeout_secs: 10,
        idle_timeout_secs: 60,
        max_lifetime_secs: 600,
        acquire_timeout_secs: 10,
        sqlx_logging: false,
    })
}

/// A migrated connection, or `None` when `DATABASE_URL` is not set.
pub async fn get_db() -> Result<Option<DatabaseConnection>, anyhow::Error> {
    let Some(cfg) = test_config() else { return Ok(None) };

    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&cfg).await?;
            migration::Migrator::up(&db, None).await?;
            drop(db);
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    let db = connect_with_config(&cfg).await?;
    Ok(Some(db))
}

mod db_flow {
    use std::sync::Arc;
    use uuid::Uuid;

    use super::get_db;
    use crate::customer::domain::{LoginInput, RegisterInput, UpdateCustomerInput};
    use crate::customer::errors::CustomerError;
    use crate::customer::password::PasswordAlgorithm;
    use crate::customer::repo::seaorm::SeaOrmCustomerRepository;
    use crate::customer::service::{AuthConfig, CustomerService};

    #[tokio::test]
    async fn customer_lifecycle_against_postgres() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await? else {
            eprintln!("DATABASE_URL missing; skip db flow test");
            return Ok(());
        };
        let repo = Arc::new(SeaOrmCustomerRepository::new(db));
        let cfg = AuthConfig { jwt_secret: "db-test-secret".into(), token_ttl_secs: 3600, bcrypt_cost: 4, password_algorithm: PasswordAlgorithm::Bcrypt };
        let svc = CustomerService::new(repo, cfg)?;

        let email = format!("svc_{}@example.com", Uuid::new_v4());
        let input = RegisterInput { name: "Svc".into(), email: email.clone(), password: "secret1".into(), balance: None };
        let created = svc.register(input.clone()).await?;
        assert!(matches!(svc.register(input).await, Err(CustomerError::Conflict)));

        let out = svc.login(LoginInput { email: email.clone(), password: "secret1".into() }).await?;
        assert_eq!(svc.verify_token(&out.token)?.id, created.id);

        let updated = svc.update(created.id, UpdateCustomerInput { name: Some("Renamed".into()), ..Default::default() }).await?;
        assert_eq!(updated.email, email);

        svc.remove(created.id).await?;
        assert!(matches!(svc.find_one(created.id).await, Err(CustomerError::NotFound)));
        Ok(())
    }
}
