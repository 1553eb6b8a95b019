use thiserror::Error;

/// Errors raised while loading or validating the configuration file.
///
/// All of these are fatal and surface before any stage runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required config key: {0}")]
    MissingKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors raised while reading or writing a stage dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file not found: {path}")]
    NotFound { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("schema mismatch in {path}: expected {schema} columns, missing [{}]", missing.join(", "))]
    SchemaMismatch {
        path: String,
        schema: &'static str,
        missing: Vec<String>,
    },
}
