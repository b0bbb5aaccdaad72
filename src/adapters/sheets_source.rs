use crate::config::SheetSourceConfig;
use crate::domain::model::SourceRow;
use crate::domain::ports::RequestSource;
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// 從 Google 試算表範圍讀取表單回覆，欄位以位置對應
pub struct SheetsRequestSource {
    client: Client,
    endpoint: Url,
    access_token: String,
    email_column: usize,
    course_name_column: usize,
}

impl SheetsRequestSource {
    pub fn new(config: &SheetSourceConfig, access_token: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: values_url(&config.api_base, &config.spreadsheet_id, &config.range)?,
            access_token,
            email_column: config.email_column,
            course_name_column: config.course_name_column,
        })
    }

    fn to_row(&self, values: &[serde_json::Value]) -> SourceRow {
        let cell = |idx: usize| {
            values.get(idx).and_then(|value| match value {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };
        SourceRow {
            course_name: cell(self.course_name_column),
            email: cell(self.email_column),
        }
    }
}

fn values_url(api_base: &str, spreadsheet_id: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(api_base).map_err(|e| ProvisionError::InvalidConfigValueError {
        field: "source.api_base".to_string(),
        value: api_base.to_string(),
        reason: e.to_string(),
    })?;

    url.path_segments_mut()
        .map_err(|_| ProvisionError::ConfigError {
            message: format!("{} cannot be used as a base URL", api_base),
        })?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", spreadsheet_id, "values", range]);

    Ok(url)
}

#[async_trait]
impl RequestSource for SheetsRequestSource {
    fn describe(&self) -> String {
        format!("spreadsheet range {}", self.endpoint)
    }

    async fn read_rows(&self) -> Result<Vec<SourceRow>> {
        tracing::debug!("Fetching spreadsheet values from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProvisionError::HttpStatus {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let range: ValueRange = response.json().await?;
        Ok(range.values.iter().map(|values| self.to_row(values)).collect())
    }
}
