use crate::utils::error::{ProvisionError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// 一次執行的完整設定，啟動時載入一次之後不再變動
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    pub canvas: CanvasConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub base_url: String,
    pub token: String,
    /// 沙盒課程專用的子帳號
    #[serde(deserialize_with = "string_or_number")]
    pub account_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub enrollment_term_id: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Csv(CsvSourceConfig),
    Sheet(SheetSourceConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_course_name_header")]
    pub course_name_column: String,
    #[serde(default = "default_email_header")]
    pub email_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSourceConfig {
    pub spreadsheet_id: String,
    /// 例如 `Form Responses 1!A2:E`
    pub range: String,
    pub client_secret_path: PathBuf,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,
    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,
    #[serde(default = "default_email_index")]
    pub email_column: usize,
    #[serde(default = "default_course_name_index")]
    pub course_name_column: usize,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_course_name_header() -> String {
    "Course Name".to_string()
}

fn default_email_header() -> String {
    "Email Address".to_string()
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_sheets_api_base() -> String {
    DEFAULT_SHEETS_API_BASE.to_string()
}

fn default_email_index() -> usize {
    1
}

fn default_course_name_index() -> usize {
    3
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

impl ProvisionConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProvisionError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${CANVAS_TOKEN})，未設定的保留原樣交給驗證處理
    fn substitute_env_vars(content: &str) -> String {
        use regex::{Captures, Regex};
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn source_kind(&self) -> &'static str {
        match self.source {
            SourceConfig::Csv(_) => "csv",
            SourceConfig::Sheet(_) => "sheet",
        }
    }
}

impl Validate for CanvasConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("canvas.base_url", &self.base_url)?;
        validation::validate_non_empty_string("canvas.token", &self.token)?;
        validation::validate_non_empty_string("canvas.account_id", &self.account_id)?;
        validation::validate_non_empty_string(
            "canvas.enrollment_term_id",
            &self.enrollment_term_id,
        )?;
        validation::validate_range("canvas.timeout_seconds", self.timeout_seconds, 1, 600)?;
        validation::validate_positive_number(
            "canvas.concurrent_requests",
            self.concurrent_requests,
            1,
        )?;
        Ok(())
    }
}

impl Validate for SourceConfig {
    fn validate(&self) -> Result<()> {
        match self {
            SourceConfig::Csv(csv) => {
                validation::validate_path("source.path", &csv.path.to_string_lossy())?;
                validation::validate_non_empty_string(
                    "source.course_name_column",
                    &csv.course_name_column,
                )?;
                validation::validate_non_empty_string("source.email_column", &csv.email_column)
            }
            SourceConfig::Sheet(sheet) => {
                validation::validate_non_empty_string(
                    "source.spreadsheet_id",
                    &sheet.spreadsheet_id,
                )?;
                validation::validate_non_empty_string("source.range", &sheet.range)?;
                validation::validate_path(
                    "source.client_secret_path",
                    &sheet.client_secret_path.to_string_lossy(),
                )?;
                validation::validate_path(
                    "source.token_cache_path",
                    &sheet.token_cache_path.to_string_lossy(),
                )?;
                validation::validate_url("source.api_base", &sheet.api_base)
            }
        }
    }
}

impl Validate for ProvisionConfig {
    fn validate(&self) -> Result<()> {
        self.canvas.validate()?;
        self.source.validate()
    }
}
