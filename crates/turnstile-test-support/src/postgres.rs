//! Disposable per-test databases carved out of an existing Postgres server.
//!
//! The server is named by `TURNSTILE_TEST_DATABASE_URL`. Each fixture creates a
//! uniquely named database on it and drops that database again on `Drop`.
//! Suites call [`start_postgres`] and skip when it returns an error.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use postgres::NoTls;
use url::Url;

/// Environment variable naming the Postgres server used by integration tests.
pub const TEST_DATABASE_URL_ENV: &str = "TURNSTILE_TEST_DATABASE_URL";

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// A freshly created database that is dropped with the handle.
pub struct TestDatabase {
    connection_string: String,
    admin_url: String,
    database: String,
}

impl TestDatabase {
    /// Connection string for `sqlx` or any other Postgres client.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Name of the generated database.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let statement = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.database);
        let _ = run_admin(&self.admin_url, statement);
    }
}

/// Create an empty database on the server named by [`TEST_DATABASE_URL_ENV`].
///
/// # Errors
///
/// Returns an error when the variable is unset, the URL is invalid, or the
/// server rejects `CREATE DATABASE`.
pub fn start_postgres() -> Result<TestDatabase> {
    let base = std::env::var(TEST_DATABASE_URL_ENV)
        .map_err(|_| anyhow!("{TEST_DATABASE_URL_ENV} is not set"))?;
    create_database_on(&base)
}

fn create_database_on(base: &str) -> Result<TestDatabase> {
    let parsed = Url::parse(base).context("invalid postgres connection url")?;
    let database = unique_database_name();

    let mut target = parsed.clone();
    target.set_path(&format!("/{database}"));

    let mut last_error = None;
    for admin_url in admin_urls(&parsed) {
        match run_admin(&admin_url, format!("CREATE DATABASE \"{database}\"")) {
            Ok(()) => {
                return Ok(TestDatabase {
                    connection_string: target.to_string(),
                    admin_url,
                    database,
                });
            }
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("failed to create test database")))
}

/// Maintenance database first, then whatever database the URL named.
fn admin_urls(base: &Url) -> Vec<String> {
    let mut maintenance = base.clone();
    maintenance.set_path("/postgres");
    let mut urls = vec![maintenance.to_string()];
    if maintenance.path() != base.path() {
        urls.push(base.to_string());
    }
    urls
}

/// The blocking client refuses to run inside a tokio runtime, so it gets its own thread.
fn run_admin(admin_url: &str, statement: String) -> Result<()> {
    let admin = admin_url.to_string();
    std::thread::spawn(move || -> Result<()> {
        let mut client = postgres::Config::from_str(&admin)?.connect(NoTls)?;
        client
            .simple_query(&statement)
            .map(|_| ())
            .with_context(|| format!("failed to run `{statement}`"))
    })
    .join()
    .unwrap_or_else(|_| Err(anyhow!("admin connection thread panicked")))
}

fn unique_database_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("turnstile_test_{}_{nanos}_{sequence}", std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_urls_prefer_maintenance_database() {
        let base = Url::parse("postgres://user:pw@localhost:5432/app").expect("url");
        assert_eq!(
            admin_urls(&base),
            vec![
                "postgres://user:pw@localhost:5432/postgres".to_string(),
                "postgres://user:pw@localhost:5432/app".to_string(),
            ]
        );

        let maintenance = Url::parse("postgres://localhost/postgres").expect("url");
        assert_eq!(admin_urls(&maintenance).len(), 1);
    }

    #[test]
    fn database_names_are_unique() {
        let first = unique_database_name();
        let second = unique_database_name();
        assert_ne!(first, second);
        assert!(first.starts_with("turnstile_test_"));
    }
}
