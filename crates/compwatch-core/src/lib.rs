//! Shared types for the compwatch pipeline.
//!
//! Holds the typed configuration and its loader, the record shapes that flow
//! between stages, and the CSV dataset format used at every stage boundary.

pub mod app_config;
pub mod config;
pub mod dataset;
pub mod error;
pub mod records;

pub use app_config::{
    AnalysisSettings, ApiSettings, AppConfig, ClassifierKind, CleaningSettings, FillValue,
    LoggingSettings, MissingPolicy, PaginationMode, PathSettings, PriceRange, ReportSettings,
    ScheduleSettings, TextField,
};
pub use config::{load_config, load_config_from_str, DEFAULT_CONFIG_PATH};
pub use dataset::{read_dataset, write_dataset, DatasetPaths, Schema};
pub use error::{ConfigError, DatasetError};
pub use records::{
    parse_timestamp, CleanRecord, EnrichedRecord, Field, RawRecord, Rejection, SentimentLabel,
    SentimentResult,
};
