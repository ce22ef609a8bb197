//! Database connection pool utilities.

#[cfg(test)]
use diesel::RunQueryDsl;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::store::StoreError;

/// Pooled PostgreSQL connections for the RepoInsight server.
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// A connection checked out of [`DbPool`].
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Embedded Diesel migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build a pool for `database_url` and bring the schema up to date.
pub fn init_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .map_err(|err| StoreError::Pool(err.to_string()))?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Run pending Diesel migrations.
pub fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    let mut conn = pool.get().map_err(|err| StoreError::Pool(err.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| StoreError::Migration(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
fn split_database_url(database_url: &str) -> (String, String) {
    let (url_base, query) = database_url.split_once('?').unwrap_or((database_url, ""));
    let (base, _db_name) = url_base
        .rsplit_once('/')
        .expect("TEST_DATABASE_URL must include a database name");
    let query_suffix = if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    };
    (base.to_string(), query_suffix)
}

#[cfg(test)]
/// A temporary PostgreSQL database created from `TEST_DATABASE_URL`.
pub(crate) struct TestDatabase {
    database_url: String,
    admin_url: String,
    db_name: String,
}

#[cfg(test)]
impl TestDatabase {
    /// Create an isolated database, or `None` when `TEST_DATABASE_URL` is unset.
    pub(crate) fn from_env() -> Option<Self> {
        use diesel::Connection;

        let base_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let (base, query_suffix) = split_database_url(&base_url);
        let db_name = format!("repoinsight_test_{}", uuid::Uuid::new_v4().simple());
        let admin_url = format!("{}/postgres{}", base, query_suffix);
        let database_url = format!("{}/{}{}", base, db_name, query_suffix);

        let mut admin_conn = PgConnection::establish(&admin_url).expect("connect admin database");
        diesel::sql_query(format!("CREATE DATABASE \"{db_name}\""))
            .execute(&mut admin_conn)
            .expect("create test database");

        Some(Self {
            database_url,
            admin_url,
            db_name,
        })
    }

    /// Return the test database URL.
    pub(crate) fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[cfg(test)]
impl Drop for TestDatabase {
    fn drop(&mut self) {
        use diesel::Connection;

        if let Ok(mut conn) = PgConnection::establish(&self.admin_url) {
            let escaped = self.db_name.replace('\'', "''");
            let _ = diesel::sql_query(format!(
                "SELECT pg_terminate_backend(pid) \
                 FROM pg_stat_activity \
                 WHERE datname = '{escaped}' AND pid <> pg_backend_pid()"
            ))
            .execute(&mut conn);
            let _ = diesel::sql_query(format!("DROP DATABASE IF EXISTS \"{}\"", self.db_name))
                .execute(&mut conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TestDatabase, init_pool, split_database_url};
    use diesel::prelude::*;
    use diesel::sql_types::Text;

    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[test]
    fn splits_database_name_and_query() {
        let (base, query) = split_database_url("postgres://u:p@localhost:5432/app?sslmode=disable");
        assert_eq!(base, "postgres://u:p@localhost:5432");
        assert_eq!(query, "?sslmode=disable");

        let (base, query) = split_database_url("postgres://localhost/app");
        assert_eq!(base, "postgres://localhost");
        assert!(query.is_empty());
    }

    #[test]
    fn init_pool_runs_migrations() {
        let Some(test_db) = TestDatabase::from_env() else {
            return;
        };
        let pool = init_pool(test_db.database_url()).expect("pool");

        let mut conn = pool.get().expect("conn");
        let tables: Vec<TableName> = diesel::sql_query(
            "SELECT tablename AS name FROM pg_tables WHERE schemaname = 'public' AND tablename = 'repository_analyses'",
        )
        .load(&mut conn)
        .expect("query tables");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "repository_analyses");
    }
}
