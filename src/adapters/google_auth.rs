use crate::utils::error::{ProvisionError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use url::Url;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// 到期前 60 秒就視為過期
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECONDS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// 試算表 API 的 OAuth2 授權（installed app 流程 + 檔案快取）
pub struct GoogleAuthorizer {
    client: Client,
    secret: ClientSecret,
    token_cache_path: PathBuf,
}

impl GoogleAuthorizer {
    pub fn new(secret: ClientSecret, token_cache_path: PathBuf) -> Self {
        Self {
            client: Client::new(),
            secret,
            token_cache_path,
        }
    }

    pub fn from_files(client_secret_path: &Path, token_cache_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(client_secret_path).map_err(|e| {
            ProvisionError::AuthError {
                message: format!(
                    "cannot read client secret {}: {}",
                    client_secret_path.display(),
                    e
                ),
            }
        })?;
        let file: ClientSecretFile = serde_json::from_str(&content)?;
        let secret = file
            .installed
            .or(file.web)
            .ok_or_else(|| ProvisionError::AuthError {
                message: format!(
                    "{} has neither an 'installed' nor a 'web' section",
                    client_secret_path.display()
                ),
            })?;

        Ok(Self::new(secret, token_cache_path.to_path_buf()))
    }

    pub fn authorization_url(&self) -> Result<Url> {
        Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", OOB_REDIRECT_URI),
                ("response_type", "code"),
                ("scope", SHEETS_READONLY_SCOPE),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| ProvisionError::AuthError {
            message: format!("invalid auth_uri {}: {}", self.secret.auth_uri, e),
        })
    }

    /// 取得存取權杖，必要時在終端機上請使用者授權
    pub async fn access_token(&self) -> Result<String> {
        self.access_token_with(prompt_for_code).await
    }

    pub async fn access_token_with<F>(&self, prompt: F) -> Result<String>
    where
        F: FnOnce(&Url) -> Result<String>,
    {
        if let Some(cached) = self.load_cache()? {
            if cached.is_fresh(Utc::now()) {
                tracing::debug!("Using cached spreadsheet token");
                return Ok(cached.access_token);
            }
            if let Some(refresh_token) = cached.refresh_token.clone() {
                tracing::info!("🔄 Refreshing expired spreadsheet token");
                let token = self.refresh(&refresh_token).await?;
                self.store_cache(&token)?;
                return Ok(token.access_token);
            }
        }

        let code = prompt(&self.authorization_url()?)?;
        let token = self.exchange_code(code.trim()).await?;
        self.store_cache(&token)?;
        tracing::info!(
            "🔐 Spreadsheet token stored in {}",
            self.token_cache_path.display()
        );
        Ok(token.access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken> {
        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
            ])
            .await?;

        Ok(CachedToken {
            refresh_token: token
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            ..token
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<CachedToken> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", OOB_REDIRECT_URI),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<CachedToken> {
        let response = self
            .client
            .post(&self.secret.token_uri)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::AuthError {
                message: format!("token endpoint returned {}: {}", status.as_u16(), body),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600)),
        })
    }

    fn load_cache(&self) -> Result<Option<CachedToken>> {
        if !self.token_cache_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.token_cache_path)?;
        match serde_json::from_str(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Ignoring unreadable token cache {}: {}",
                    self.token_cache_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    fn store_cache(&self, token: &CachedToken) -> Result<()> {
        if let Some(parent) = self.token_cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.token_cache_path, serde_json::to_vec_pretty(token)?)?;
        Ok(())
    }
}

fn prompt_for_code(url: &Url) -> Result<String> {
    println!(
        "Open the following URL in the browser and enter the resulting code after authorization:\n{}",
        url
    );
    print!("Code: ");
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin().lock().read_line(&mut code)?;
    if code.trim().is_empty() {
        return Err(ProvisionError::AuthError {
            message: "no authorization code entered".to_string(),
        });
    }
    Ok(code)
}
