use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::auth::Credential;

#[async_trait::async_trait]
pub trait CredentialRepository {
    async fn credential_exists(&self) -> Result<bool, AppError>;
    async fn get_credential(&self) -> Result<Option<Credential>, AppError>;
    /// Stores the PIN hash. Returns `None` when a credential already exists.
    async fn create_credential(&self, pin_hash: &str) -> Result<Option<Credential>, AppError>;
}

#[async_trait::async_trait]
impl CredentialRepository for PostgresRepository {
    async fn credential_exists(&self) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM credential)")
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn get_credential(&self) -> Result<Option<Credential>, AppError> {
        let credential = sqlx::query_as::<_, Credential>("SELECT pin_hash, created_at FROM credential LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    async fn create_credential(&self, pin_hash: &str) -> Result<Option<Credential>, AppError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credential (pin_hash)
            VALUES ($1)
            ON CONFLICT (singleton) DO NOTHING
            RETURNING pin_hash, created_at
            "#,
        )
        .bind(pin_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }
}
