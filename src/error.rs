use thiserror::Error;

/// Errors raised while building or loading a `FormDefinition`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("Failed to parse form definition JSON: {0}")]
    JsonParseError(String),

    #[error("Field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("Select field '{0}' must declare at least one option")]
    MissingOptions(String),

    #[error("Field '{0}' declares options but is not a select field")]
    UnexpectedOptions(String),

    #[error("Rule for '{0}' declares no dependencies")]
    EmptyDependencies(String),

    #[error("Rule for '{target}' reads field '{field}', which the form does not declare")]
    UnknownField { target: String, field: String },

    #[error("Rule target '{0}' is not a declared field")]
    UnknownTarget(String),

    #[error("Rule for '{target}' asks for {decimals} decimals; at most {max} are supported", max = crate::ast::MAX_DECIMALS)]
    DecimalsOutOfRange { target: String, decimals: u32 },
}

/// Errors that can occur while evaluating a formula against a record.
///
/// These never reach the caller of the engine: a failing formula means the
/// rule cannot compute yet and its target is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Input field '{0}' has no value in the record")]
    InputNotFound(String),

    #[error("Input field '{field}' is not numeric: '{found}'")]
    NotNumeric { field: String, found: String },

    #[error("Operation '{operation}' produced a non-finite result")]
    NonFinite { operation: String },

    #[error("Cannot round to {0} decimals; at most {max} are supported", max = crate::ast::MAX_DECIMALS)]
    DigitsOutOfRange(u32),
}

/// Errors reported by a record service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("no record stored for '{identifier}'")]
    NotFound { identifier: String },

    #[error("invalid record identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("record I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    /// The message the remote side supplied for the user, if any.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ServiceError::Rejected {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

/// Errors surfaced by `FormEngine::submit`.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{message}")]
    SaveFailed {
        message: String,
        #[source]
        source: ServiceError,
    },

    #[error("the form has no record identifier to save under")]
    NoIdentifier,
}

impl SubmitError {
    /// Text to show the user in a transient notification.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Errors raised while loading an `EngineConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}
