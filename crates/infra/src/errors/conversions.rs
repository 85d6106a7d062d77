//! Conversions from external infrastructure errors into domain errors.

use lubesync_domain::LubeSyncError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LubeSyncError);

impl From<InfraError> for LubeSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LubeSyncError> for InfraError {
    fn from(value: LubeSyncError) -> Self {
        InfraError(value)
    }
}

trait IntoLubeSyncError {
    fn into_lubesync(self) -> LubeSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → LubeSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLubeSyncError for SqlError {
    fn into_lubesync(self) -> LubeSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        LubeSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        LubeSyncError::Database("database is locked".into())
                    }
                    // SQLITE_CONSTRAINT_PRIMARYKEY and SQLITE_CONSTRAINT_UNIQUE
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        LubeSyncError::Database("unique constraint violation".into())
                    }
                    _ => LubeSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => LubeSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                LubeSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LubeSyncError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => LubeSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => LubeSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_lubesync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → LubeSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(LubeSyncError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
