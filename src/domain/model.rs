use crate::utils::error::{ProvisionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 課程名稱缺少時使用的預設值
pub const UNTITLED_COURSE: &str = "Untitled";

/// 來源（試算表或 CSV）的一列原始資料
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    pub course_name: Option<String>,
    pub email: Option<String>,
}

/// 一筆沙盒課程申請
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRequest {
    pub course_name: String,
    pub requester_login: String,
}

impl CourseRequest {
    pub fn from_row(row: &SourceRow) -> Result<Self> {
        let course_name = row
            .course_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNTITLED_COURSE)
            .to_string();

        let email = row.email.as_deref().map(str::trim).unwrap_or_default();
        let requester_login = extract_login(email)?;

        Ok(Self {
            course_name,
            requester_login,
        })
    }

    pub fn course_code(&self) -> &str {
        self.course_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.course_name)
    }
}

/// 取出 email 中 `@` 之前的登入帳號，網域不同的帳號視為同一人
pub fn extract_login(email: &str) -> Result<String> {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => Ok(local.to_string()),
        Some(_) => Err(ProvisionError::ValidationError {
            message: format!("Email address '{}' has an empty login", email),
        }),
        None if email.is_empty() => Err(ProvisionError::ValidationError {
            message: "Email address is missing".to_string(),
        }),
        None => Err(ProvisionError::ValidationError {
            message: format!("Email address '{}' has no '@'", email),
        }),
    }
}

/// LMS 的課程 ID，回應中可能是數字或字串
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

/// 使用者在 LMS 目錄中的內部 ID（不同於登入帳號）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryId(pub String);

impl CourseId {
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        json_id(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DirectoryId {
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        json_id(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 建立課程的請求內容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub course_code: String,
    pub account_id: String,
    pub enrollment_term_id: String,
}

/// 使用者搜尋結果中的一筆
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
    #[serde(deserialize_with = "deserialize_directory_id")]
    pub id: DirectoryId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
}

fn deserialize_directory_id<'de, D>(deserializer: D) -> std::result::Result<DirectoryId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    DirectoryId::from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid user id: {}", value)))
}

/// 課程建立成功後進入 worklist 的項目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub requester_login: String,
    pub course_id: CourseId,
    pub course_name: String,
}

/// 每筆記錄的處理結果，一筆對應一行主控台輸出
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    RequestRejected {
        reason: String,
    },
    CourseCreationFailed {
        course_name: String,
        status: Option<u16>,
        reason: String,
    },
    CourseCreated {
        course_id: CourseId,
        requester_login: String,
    },
    RequesterNotResolved {
        login: String,
        course_id: CourseId,
        reason: String,
    },
    Enrolled {
        course_id: CourseId,
        user_id: DirectoryId,
    },
    EnrollmentFailed {
        endpoint: String,
        status: Option<u16>,
        reason: String,
    },
}

impl Diagnostic {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::CourseCreated { .. } | Self::Enrolled { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestRejected { reason } => write!(f, "Skipping request: {}", reason),
            Self::CourseCreationFailed {
                status: Some(status),
                ..
            } => write!(
                f,
                "Error {} encountered. Please check the data and try again.",
                status
            ),
            Self::CourseCreationFailed {
                course_name,
                status: None,
                reason,
            } => write!(f, "Could not create course '{}': {}", course_name, reason),
            Self::CourseCreated {
                course_id,
                requester_login,
            } => write!(f, "Created course {} for {}", course_id, requester_login),
            Self::RequesterNotResolved {
                login,
                course_id,
                reason,
            } => write!(
                f,
                "Could not resolve '{}' for course {}: {}",
                login, course_id, reason
            ),
            Self::Enrolled { course_id, .. } => write!(
                f,
                "The course {} has been created and updated successfully.",
                course_id
            ),
            Self::EnrollmentFailed {
                endpoint,
                status: Some(status),
                ..
            } => write!(f, "{} returned {}", endpoint, status),
            Self::EnrollmentFailed {
                endpoint,
                status: None,
                reason,
            } => write!(f, "{} failed: {}", endpoint, reason),
        }
    }
}

/// 一次執行的彙總，只存在記憶體中
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub diagnostics: Vec<Diagnostic>,
    pub requested: usize,
    pub rejected: usize,
    pub created: usize,
    pub creation_failed: usize,
    pub enrolled: Vec<(CourseId, DirectoryId)>,
    pub resolution_failed: usize,
    pub enrollment_failed: usize,
}

impl RunReport {
    pub fn record(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::RequestRejected { .. } => self.rejected += 1,
            Diagnostic::CourseCreationFailed { .. } => self.creation_failed += 1,
            Diagnostic::CourseCreated { .. } => self.created += 1,
            Diagnostic::RequesterNotResolved { .. } => self.resolution_failed += 1,
            Diagnostic::Enrolled { course_id, user_id } => {
                self.enrolled.push((course_id.clone(), user_id.clone()))
            }
            Diagnostic::EnrollmentFailed { .. } => self.enrollment_failed += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn failures(&self) -> usize {
        self.rejected + self.creation_failed + self.resolution_failed + self.enrollment_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, email: Option<&str>) -> SourceRow {
        SourceRow {
            course_name: name.map(String::from),
            email: email.map(String::from),
        }
    }

    #[test]
    fn test_course_code_is_first_word() {
        let request =
            CourseRequest::from_row(&row(Some("Biology Period 4"), Some("t@school.org"))).unwrap();
        assert_eq!(request.course_name, "Biology Period 4");
        assert_eq!(request.course_code(), "Biology");
    }

    #[test]
    fn test_course_code_without_whitespace_is_whole_name() {
        let request = CourseRequest::from_row(&row(Some("Chemistry"), Some("t@school.org"))).unwrap();
        assert_eq!(request.course_code(), "Chemistry");
    }

    #[test]
    fn test_missing_or_empty_name_defaults_to_untitled() {
        for name in [None, Some(""), Some("   ")] {
            let request = CourseRequest::from_row(&row(name, Some("t@school.org"))).unwrap();
            assert_eq!(request.course_name, UNTITLED_COURSE);
            assert_eq!(request.course_code(), UNTITLED_COURSE);
        }
    }

    #[test]
    fn test_login_ignores_domain() {
        assert_eq!(extract_login("alice@schoolA").unwrap(), "alice");
        assert_eq!(extract_login("alice@nths.net").unwrap(), "alice");
        assert_eq!(extract_login("alice@newtrier.k12.il.us").unwrap(), "alice");
    }

    #[test]
    fn test_malformed_login_is_rejected() {
        assert!(extract_login("alice").is_err());
        assert!(extract_login("@school.org").is_err());
        assert!(extract_login("").is_err());
        assert!(CourseRequest::from_row(&row(Some("Art"), None)).is_err());
    }

    #[test]
    fn test_json_ids_accept_numbers_and_strings() {
        assert_eq!(
            CourseId::from_json(&serde_json::json!(1234)),
            Some(CourseId("1234".to_string()))
        );
        assert_eq!(
            CourseId::from_json(&serde_json::json!("C1")),
            Some(CourseId("C1".to_string()))
        );
        assert_eq!(CourseId::from_json(&serde_json::json!(null)), None);
    }

    #[test]
    fn test_diagnostic_lines() {
        let failed = Diagnostic::CourseCreationFailed {
            course_name: "Art".to_string(),
            status: Some(422),
            reason: String::new(),
        };
        assert_eq!(
            failed.to_string(),
            "Error 422 encountered. Please check the data and try again."
        );

        let enrolled = Diagnostic::Enrolled {
            course_id: CourseId("C1".to_string()),
            user_id: DirectoryId("U9".to_string()),
        };
        assert!(enrolled.to_string().contains("C1"));
        assert!(!enrolled.is_failure());
    }
}
