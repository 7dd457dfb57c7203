use thiserror::Error;

/// Constraint raised by the capacity trigger on `enrollments`.
pub const CAPACITY_CONSTRAINT: &str = "enrollments_session_capacity";
/// Unique key on `enrollments (session_id, student_id)`.
pub const ENROLLMENT_KEY_CONSTRAINT: &str = "enrollments_session_student_key";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    #[error("Session capacity exceeded")]
    CapacityExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Unknown database error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.constraint() {
                Some(CAPACITY_CONSTRAINT) => return DatabaseError::CapacityExceeded,
                Some(ENROLLMENT_KEY_CONSTRAINT) => return DatabaseError::Duplicate,
                _ => {}
            }
            if db_err.is_unique_violation() {
                return DatabaseError::Duplicate;
            }
        }
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            other => DatabaseError::Sqlx(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DatabaseError::NotFound));
    }

    #[test]
    fn other_errors_stay_wrapped() {
        let err: DatabaseError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)));
    }
}
