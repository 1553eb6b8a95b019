use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::records::Field;

/// Fully validated pipeline configuration.
///
/// Built by [`crate::load_config`]; every stage reads its own section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub paths: PathSettings,
    pub cleaning: CleaningSettings,
    pub analysis: AnalysisSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationMode {
    /// `limit` / `skip` query parameters, stop on a short page.
    Offset,
    /// Follow the `rel="next"` URL of the `Link` response header.
    LinkHeader,
    /// Single request, no pagination.
    None,
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSettings {
    /// Required. Validated as an http(s) URL at load time.
    pub base_url: Option<String>,
    pub endpoint: String,
    pub auth_token: Option<String>,
    pub auth_header: String,
    pub page_size: u32,
    pub pagination: PaginationMode,
    /// Key holding the record array when the API wraps pages in an object.
    pub records_field: String,
    pub max_pages: usize,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub retry_backoff_max_ms: u64,
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoint: "/products".to_string(),
            auth_token: None,
            auth_header: "Authorization".to_string(),
            page_size: 50,
            pagination: PaginationMode::Offset,
            records_field: "products".to_string(),
            max_pages: 200,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_backoff_base_ms: 500,
            retry_backoff_max_ms: 30_000,
            user_agent: "compwatch/0.1 (competitor-monitoring)".to_string(),
        }
    }
}

impl std::fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("auth_header", &self.auth_header)
            .field("page_size", &self.page_size)
            .field("pagination", &self.pagination)
            .field("records_field", &self.records_field)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("retry_backoff_max_ms", &self.retry_backoff_max_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            processed_dir: PathBuf::from("data/processed"),
            output_dir: PathBuf::from("data/output"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Literal used by the `fill-default` policy. YAML numbers and strings are
/// both accepted so `default: 0` and `default: Uncategorized` read naturally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Number(n) => write!(f, "{n}"),
            FillValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// What the cleaner does with a missing value in one field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PolicyEntry")]
pub enum MissingPolicy {
    DropRow,
    FillDefault { default: FillValue },
    FillMean,
    Keep,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PolicyKind {
    DropRow,
    FillDefault,
    FillMean,
    Keep,
}

/// On-disk shape of one `cleaning.missing` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyEntry {
    policy: PolicyKind,
    default: Option<FillValue>,
}

impl TryFrom<PolicyEntry> for MissingPolicy {
    type Error = String;

    fn try_from(entry: PolicyEntry) -> Result<Self, Self::Error> {
        match (entry.policy, entry.default) {
            (PolicyKind::FillDefault, Some(default)) => Ok(MissingPolicy::FillDefault { default }),
            (PolicyKind::FillDefault, None) => Err("fill-default requires `default`".to_string()),
            (_, Some(_)) => Err("`default` is only allowed with fill-default".to_string()),
            (PolicyKind::DropRow, None) => Ok(MissingPolicy::DropRow),
            (PolicyKind::FillMean, None) => Ok(MissingPolicy::FillMean),
            (PolicyKind::Keep, None) => Ok(MissingPolicy::Keep),
        }
    }
}

impl std::fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingPolicy::DropRow => write!(f, "drop-row"),
            MissingPolicy::FillDefault { .. } => write!(f, "fill-default"),
            MissingPolicy::FillMean => write!(f, "fill-mean"),
            MissingPolicy::Keep => write!(f, "keep"),
        }
    }
}

/// Inclusive bounds for a valid price.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningSettings {
    /// Per-field overrides; fields not listed use [`CleaningSettings::default_policy`].
    pub missing: BTreeMap<Field, MissingPolicy>,
    pub price_range: Option<PriceRange>,
}

impl CleaningSettings {
    /// Built-in policy for a field when the config does not name one.
    #[must_use]
    pub fn default_policy(field: Field) -> MissingPolicy {
        match field {
            Field::Description => MissingPolicy::Keep,
            Field::Category => MissingPolicy::FillDefault {
                default: FillValue::Text("Uncategorized".to_string()),
            },
            Field::Name | Field::Price | Field::CollectedAt => MissingPolicy::DropRow,
        }
    }

    /// Effective policy for `field`.
    #[must_use]
    pub fn policy_for(&self, field: Field) -> MissingPolicy {
        self.missing
            .get(&field)
            .cloned()
            .unwrap_or_else(|| Self::default_policy(field))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Lexicon,
    Remote,
}

/// Which record field the analyzer classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextField {
    Description,
    Name,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSettings {
    pub classifier: ClassifierKind,
    pub remote_url: Option<String>,
    pub batch_size: usize,
    pub max_input_chars: usize,
    pub batch_timeout_secs: Option<u64>,
    pub text_field: TextField,
    pub neutral_threshold: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::Lexicon,
            remote_url: None,
            batch_size: 16,
            max_input_chars: 512,
            batch_timeout_secs: None,
            text_field: TextField::Description,
            neutral_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub top_n: usize,
    pub file_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_n: 5,
            file_name: "dashboard.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `compwatch_collector=debug,info`.
    pub level: String,
    pub console: bool,
    pub file: bool,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            file: true,
            file_prefix: "pipeline.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    /// Six-field cron expression (seconds first).
    pub cron: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            cron: "0 0 8 * * *".to_string(),
        }
    }
}
