//! Database dispatch macros for reducing code duplication.
//!
//! sqlx pools are typed per backend, so code that runs the same statement on
//! every backend is written once here and expanded per `DbPool` variant.

/// Generate match arms over `DbPool` variants.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => p.close().await,
///     Postgres(p) => p.close().await,
///     SQLite(p) => p.close().await,
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

/// Acquire one connection from a typed pool and run a scalar `COUNT(*)` on it.
///
/// Evaluates to `DbResult<i64>`. The connection is returned to the pool when the
/// block ends, whether the query succeeded, failed, or the future was dropped.
#[macro_export]
macro_rules! count_rows_on {
    ($pool:expr, $sql:expr, $database:expr, $table:expr) => {
        match $pool.acquire().await {
            Ok(mut conn) => sqlx::query_scalar::<_, i64>($sql)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| $crate::error::DbError::from_query_failure($database, $table, e)),
            Err(e) => Err($crate::error::DbError::from_acquire_failure(
                $database, $table, e,
            )),
        }
    };
}

pub use count_rows_on;
pub use impl_db_dispatch;
