use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("relational backend is disabled by configuration")]
    Disabled,
    #[error("link store is unavailable")]
    Unavailable,
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("database query error: {0}")]
    Query(String),
    #[error("schema migration error: {0}")]
    Migration(String),
    #[error("link file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("link file is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid link request: {0}")]
    InvalidInput(String),
}

impl DatabaseError {
    /// Connectivity failures are the only errors that take a backend offline.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Unavailable)
    }
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Query(value.to_string())
    }
}

impl From<diesel::ConnectionError> for DatabaseError {
    fn from(value: diesel::ConnectionError) -> Self {
        Self::Connection(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::DatabaseError;

    #[test]
    fn connectivity_errors_are_classified() {
        assert!(DatabaseError::Connection("refused".to_string()).is_connectivity());
        assert!(DatabaseError::Unavailable.is_connectivity());
        assert!(!DatabaseError::Query("syntax".to_string()).is_connectivity());
        assert!(!DatabaseError::Disabled.is_connectivity());
    }
}
