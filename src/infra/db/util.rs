use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// SQLSTATE raised when a statement is cancelled by `statement_timeout`.
const QUERY_CANCELED: &str = "57014";

/// SQLSTATE raised for malformed literals such as an invalid UUID.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => {
            let code = db.code();
            if code.as_deref() == Some(QUERY_CANCELED) {
                return RepoError::Timeout;
            }
            if code.as_deref() == Some(INVALID_TEXT_REPRESENTATION) {
                return RepoError::InvalidInput {
                    message: db.message().to_string(),
                };
            }
            match db.kind() {
                ErrorKind::UniqueViolation => RepoError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                },
                ErrorKind::ForeignKeyViolation => RepoError::InvalidInput {
                    message: db.message().to_string(),
                },
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => RepoError::Integrity {
                    message: db.message().to_string(),
                },
                _ => RepoError::from_persistence(db.message()),
            }
        }
        other => RepoError::from_persistence(other),
    }
}

/// Treat "no rows affected" as a missing record.
pub fn ensure_affected(rows_affected: u64) -> Result<(), RepoError> {
    if rows_affected == 0 {
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}

pub fn convert_count(value: i64) -> Result<u64, RepoError> {
    value
        .try_into()
        .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
}
