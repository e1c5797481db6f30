//! PostgreSQL-backed credential store.
//!
//! The credential set lives in a single row and is replaced wholesale; there
//! is no partial-field update.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use super::{CredentialStore, RepositoryError};
use crate::models::ShopifyCredentials;

/// Internal row type for the credential query.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    shop_domain: String,
    api_key: String,
    api_secret: String,
    access_token: String,
}

impl From<CredentialRow> for ShopifyCredentials {
    fn from(row: CredentialRow) -> Self {
        Self {
            shop_domain: row.shop_domain,
            api_key: SecretString::from(row.api_key),
            api_secret: SecretString::from(row.api_secret),
            access_token: SecretString::from(row.access_token),
        }
    }
}

/// PostgreSQL implementation of [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn load(&self) -> Result<Option<ShopifyCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT shop_domain, api_key, api_secret, access_token \
             FROM shopify_credentials WHERE id = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ShopifyCredentials::from))
    }

    async fn replace(&self, credentials: &ShopifyCredentials) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO shopify_credentials (id, shop_domain, api_key, api_secret, access_token) \
             VALUES (TRUE, $1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 shop_domain = EXCLUDED.shop_domain, \
                 api_key = EXCLUDED.api_key, \
                 api_secret = EXCLUDED.api_secret, \
                 access_token = EXCLUDED.access_token, \
                 updated_at = NOW()",
        )
        .bind(&credentials.shop_domain)
        .bind(credentials.api_key.expose_secret())
        .bind(credentials.api_secret.expose_secret())
        .bind(credentials.access_token.expose_secret())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
