use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection failed: {0}")]
    Connection(String),
    #[error("database query failed: {0}")]
    Query(String),
    #[error("database migration failed: {0}")]
    Migration(String),
}

#[cfg(feature = "sqlite")]
impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }
}
