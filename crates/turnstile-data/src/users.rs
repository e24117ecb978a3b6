//! `PostgreSQL` user directory.
//!
//! # Design
//! - Uniqueness is enforced by the primary key on `identity` and the
//!   `users_email_key` constraint; violations surface as
//!   [`DirectoryError::Duplicate`].
//! - Refresh rotation is one conditional `UPDATE`, so concurrent refreshes
//!   presenting the same token serialise on the row lock and only one matches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use turnstile_auth::{
    CredentialRecord, DirectoryError, DirectoryResult, NewCredential, Role, UserDirectory,
};

use crate::error::DataError;

const EMAIL_CONSTRAINT: &str = "users_email_key";

const SELECT_BY_IDENTITY: &str = r"
    SELECT identity, email, password_hash, role, refresh_token, created_at
    FROM users
    WHERE identity = $1
";

const SELECT_BY_EMAIL: &str = r"
    SELECT identity, email, password_hash, role, refresh_token, created_at
    FROM users
    WHERE email = $1
";

const INSERT_USER: &str = r"
    INSERT INTO users (identity, email, password_hash, role, created_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING identity, email, password_hash, role, refresh_token, created_at
";

const SET_REFRESH_TOKEN: &str = r"
    UPDATE users SET refresh_token = $2 WHERE identity = $1
";

const SWAP_REFRESH_TOKEN: &str = r"
    UPDATE users
    SET refresh_token = $3
    WHERE identity = $1 AND refresh_token = $2
";

const REPLACE_PASSWORD_HASH: &str = r"
    UPDATE users SET password_hash = $2, refresh_token = NULL WHERE identity = $1
";

/// Directory backed by the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Wrap an already migrated pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    identity: String,
    email: String,
    password_hash: String,
    role: String,
    refresh_token: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for CredentialRecord {
    type Error = DataError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|err| DataError::InvalidRole { value: err.value })?;
        Ok(Self {
            identity: row.identity,
            email: row.email,
            password_hash: row.password_hash,
            role,
            refresh_token: row.refresh_token,
            created_at: row.created_at,
        })
    }
}

fn backend(operation: &'static str, err: DataError) -> DirectoryError {
    DirectoryError::Backend {
        operation,
        source: Box::new(err),
    }
}

fn query_failed(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DirectoryError {
    move |source| backend(operation, DataError::query(operation, source))
}

fn into_record(
    operation: &'static str,
    row: Option<UserRow>,
) -> DirectoryResult<Option<CredentialRecord>> {
    row.map(CredentialRecord::try_from)
        .transpose()
        .map_err(|err| backend(operation, err))
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_identity(&self, identity: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_BY_IDENTITY)
            .bind(identity)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("users.find_by_identity"))?;
        into_record("users.find_by_identity", row)
    }

    async fn find_by_email(&self, email: &str) -> DirectoryResult<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("users.find_by_email"))?;
        into_record("users.find_by_email", row)
    }

    async fn insert(&self, record: NewCredential) -> DirectoryResult<CredentialRecord> {
        let result = sqlx::query_as::<_, UserRow>(INSERT_USER)
            .bind(&record.identity)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(record.role.as_str())
            .bind(record.created_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => CredentialRecord::try_from(row).map_err(|err| backend("users.insert", err)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let field = if db.constraint() == Some(EMAIL_CONSTRAINT) {
                    "email"
                } else {
                    "username"
                };
                Err(DirectoryError::Duplicate { field })
            }
            Err(source) => Err(query_failed("users.insert")(source)),
        }
    }

    async fn set_refresh_token(
        &self,
        identity: &str,
        token: Option<&str>,
    ) -> DirectoryResult<bool> {
        let result = sqlx::query(SET_REFRESH_TOKEN)
            .bind(identity)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(query_failed("users.set_refresh_token"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn swap_refresh_token(
        &self,
        identity: &str,
        expected: &str,
        next: &str,
    ) -> DirectoryResult<bool> {
        let result = sqlx::query(SWAP_REFRESH_TOKEN)
            .bind(identity)
            .bind(expected)
            .bind(next)
            .execute(&self.pool)
            .await
            .map_err(query_failed("users.swap_refresh_token"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn replace_password_hash(
        &self,
        identity: &str,
        password_hash: &str,
    ) -> DirectoryResult<bool> {
        let result = sqlx::query(REPLACE_PASSWORD_HASH)
            .bind(identity)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(query_failed("users.replace_password_hash"))?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        UserRow {
            identity: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$argon2id$stub".into(),
            role: role.into(),
            refresh_token: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rows_convert_to_records() {
        let record = CredentialRecord::try_from(row("admin")).expect("record");
        assert_eq!(record.role, Role::Admin);
        assert!(!record.has_session());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = CredentialRecord::try_from(row("root")).unwrap_err();
        assert!(matches!(err, DataError::InvalidRole { value } if value == "root"));
    }
}
