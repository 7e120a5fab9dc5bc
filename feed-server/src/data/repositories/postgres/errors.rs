use crate::domain::error::DomainError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Translates constraint violations into domain errors; everything else is a
/// storage failure and keeps the driver error as its source.
pub(crate) fn map_db_error(err: sqlx::Error, duplicate: &str, missing: &str) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return DomainError::AlreadyExists(duplicate.to_string()),
            Some(FOREIGN_KEY_VIOLATION) => return DomainError::NotFound(missing.to_string()),
            _ => {}
        }
    }
    DomainError::Storage(err)
}

#[cfg(test)]
mod tests {
    use super::map_db_error;
    use crate::domain::error::DomainError;

    #[test]
    fn non_database_errors_stay_storage_errors() {
        let err = map_db_error(sqlx::Error::PoolTimedOut, "like", "post");
        assert!(matches!(err, DomainError::Storage(sqlx::Error::PoolTimedOut)));
    }
}
