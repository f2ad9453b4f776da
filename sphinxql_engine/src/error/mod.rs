use thiserror::Error;

/// Error category for decision-making (fix the call, fix the mode, inspect
/// the server, reconnect)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller asked for something the rowset does not have
    Usage,
    /// Operation is invalid for the cursor's current fetch state
    State,
    /// Failure reported by the underlying statement handle
    Executor,
    /// Connection lost - should reconnect
    ConnectionLost,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SphinxQlError {
    #[error("Row {index} does not exist (row count {row_count})")]
    RowNotFound { index: usize, row_count: usize },

    #[error("The next row does not exist (position {position:?}, row count {row_count})")]
    NoNextRow {
        position: Option<usize>,
        row_count: usize,
    },

    #[error("No row is positioned or fetched yet")]
    NoCurrentRow,

    #[error("Fetch mode conflict: {0}")]
    ModeConflict(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Result resources have already been released")]
    ResourceReleased,

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Executor error: {message}")]
    Executor {
        sqlstate: [u8; 5],
        native_code: i32,
        message: String,
    },

    #[error("Connection error: {0}")]
    Connection(String),
}

impl SphinxQlError {
    /// Builds an executor failure with the generic `HY000` state.
    pub fn executor(native_code: i32, message: impl Into<String>) -> Self {
        SphinxQlError::Executor {
            sqlstate: *b"HY000",
            native_code,
            message: message.into(),
        }
    }

    pub fn sqlstate(&self) -> [u8; 5] {
        match self {
            SphinxQlError::Executor { sqlstate, .. } => *sqlstate,
            _ => [0u8; 5],
        }
    }

    pub fn native_code(&self) -> i32 {
        match self {
            SphinxQlError::Executor { native_code, .. } => *native_code,
            _ => 0,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SphinxQlError::Executor { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }

    /// Returns true if the error came from the statement handle rather than
    /// from cursor bookkeeping
    pub fn is_executor_error(&self) -> bool {
        matches!(
            self,
            SphinxQlError::Executor { .. } | SphinxQlError::Connection(_)
        )
    }

    /// Returns true if this is a connection-related error
    pub fn is_connection_error(&self) -> bool {
        match self {
            SphinxQlError::Connection(_) => true,
            SphinxQlError::Executor { sqlstate, .. } => sqlstate[0] == b'0' && sqlstate[1] == b'8',
            _ => false,
        }
    }

    /// Returns the error category for decision-making
    pub fn error_category(&self) -> ErrorCategory {
        if self.is_connection_error() {
            return ErrorCategory::ConnectionLost;
        }
        match self {
            SphinxQlError::RowNotFound { .. }
            | SphinxQlError::NoNextRow { .. }
            | SphinxQlError::NoCurrentRow
            | SphinxQlError::UnsupportedOperation(_) => ErrorCategory::Usage,
            SphinxQlError::ModeConflict(_)
            | SphinxQlError::ResourceReleased
            | SphinxQlError::UnsupportedFeature(_) => ErrorCategory::State,
            SphinxQlError::Executor { .. } | SphinxQlError::Connection(_) => {
                ErrorCategory::Executor
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SphinxQlError>;
