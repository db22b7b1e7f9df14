use std::time::Duration;

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::result::{Error as DieselError, QueryResult};
use diesel::sqlite::SqliteConnection;
use r2d2::{CustomizeConnection, Pool};
use rand::Rng;
use tracing::warn;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Attempts made for a write before the busy error is returned to the caller
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Base delay for the exponential backoff between write attempts
const BASE_BACKOFF_MS: u64 = 20;

/// Applies the per-connection pragmas every pooled connection needs
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 2000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a connection pool for the given SQLite database URL
///
/// ### Arguments
///
/// * `database_url` - A file path or SQLite URI (`file:...?mode=memory&cache=shared`)
///
/// ### Returns
///
/// The connection pool, or an error if the first connections could not be opened
pub fn init_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .with_context(|| format!("Failed to create pool for {}", database_url))
}

/// Runs a write, retrying while SQLite reports the database as busy or locked
///
/// Each retry waits `BASE_BACKOFF_MS * 2^attempt` plus up to half of that again
/// as jitter, so concurrent writers don't retry in lockstep.
pub async fn run_with_retry<T, F>(mut op: F) -> QueryResult<T>
where
    F: FnMut() -> QueryResult<T>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Err(err) if is_busy(&err) && attempt + 1 < MAX_WRITE_ATTEMPTS => {
                attempt += 1;
                let backoff = BASE_BACKOFF_MS << attempt;
                let jitter = rand::rng().random_range(0..=backoff / 2);
                warn!(attempt, "Database busy, retrying write in {}ms", backoff + jitter);
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }
            result => return result,
        }
    }
}

fn is_busy(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(_, info) => {
            let message = info.message();
            message.contains("database is locked") || message.contains("database table is locked")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked_error() -> DieselError {
        DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("database is locked".to_string()),
        )
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_busy_errors() {
        let calls = AtomicU32::new(0);

        let result = run_with_retry(|| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(locked_error())
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: QueryResult<()> = run_with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(locked_error())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_other_errors() {
        let calls = AtomicU32::new(0);

        let result: QueryResult<()> = run_with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DieselError::NotFound)
        })
        .await;

        assert!(matches!(result, Err(DieselError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_pool_applies_foreign_keys() {
        use diesel::sql_types::Integer;
        use diesel::{QueryableByName, RunQueryDsl};

        #[derive(QueryableByName)]
        struct Pragma {
            #[diesel(sql_type = Integer)]
            foreign_keys: i32,
        }

        let url = format!("file:pool_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
        let pool = init_pool(&url).unwrap();
        let mut conn = pool.get().unwrap();
        let pragma: Pragma = diesel::sql_query("PRAGMA foreign_keys")
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(pragma.foreign_keys, 1);
    }
}
