use crate::config::CanvasConfig;
use crate::domain::model::{CourseId, DirectoryId, DirectoryUser, NewCourse};
use crate::domain::ports::LmsApi;
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

pub const TEACHER_ENROLLMENT: &str = "TeacherEnrollment";
pub const ACTIVE_STATE: &str = "active";

/// Canvas REST API 用戶端
pub struct CanvasClient {
    client: Client,
    base_url: String,
    token: String,
}

impl CanvasClient {
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    /// 只有 200 算成功，其餘狀態碼一律回報
    async fn expect_ok(endpoint: &str, response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("{} responded with {}", endpoint, status);

        if status == StatusCode::OK {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            if !body.is_empty() {
                tracing::debug!("Error body from {}: {}", endpoint, body);
            }
            Err(ProvisionError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl LmsApi for CanvasClient {
    async fn create_course(&self, course: &NewCourse) -> Result<CourseId> {
        let endpoint = self.url("/api/v1/accounts/self/courses");
        let form = [
            ("course[name]", course.name.as_str()),
            ("course[course_code]", course.course_code.as_str()),
            ("course[account_id]", course.account_id.as_str()),
            ("course[enrollment_term_id]", course.enrollment_term_id.as_str()),
        ];

        tracing::debug!("POST {} ({})", endpoint, course.name);
        let response = self
            .authorized(self.client.post(&endpoint))
            .form(&form)
            .send()
            .await?;
        let response = Self::expect_ok(&endpoint, response).await?;

        let body: serde_json::Value = response.json().await?;
        body.get("id")
            .and_then(CourseId::from_json)
            .ok_or_else(|| ProvisionError::ProcessingError {
                message: format!("Course response from {} has no id", endpoint),
            })
    }

    async fn search_users(&self, search_term: &str) -> Result<Vec<DirectoryUser>> {
        let endpoint = self.url("/api/v1/accounts/self/users");

        tracing::debug!("GET {}?search_term={}", endpoint, search_term);
        let response = self
            .authorized(self.client.get(&endpoint))
            .query(&[("search_term", search_term)])
            .send()
            .await?;
        let response = Self::expect_ok(&endpoint, response).await?;

        Ok(response.json().await?)
    }

    async fn enroll_teacher(&self, course_id: &CourseId, user_id: &DirectoryId) -> Result<()> {
        let endpoint = self.enrollments_endpoint(course_id);
        let form = [
            ("enrollment[user_id]", user_id.as_str()),
            ("enrollment[type]", TEACHER_ENROLLMENT),
            ("enrollment[enrollment_state]", ACTIVE_STATE),
        ];

        tracing::debug!("POST {} (user {})", endpoint, user_id);
        let response = self
            .authorized(self.client.post(&endpoint))
            .form(&form)
            .send()
            .await?;
        Self::expect_ok(&endpoint, response).await?;
        Ok(())
    }

    fn enrollments_endpoint(&self, course_id: &CourseId) -> String {
        self.url(&format!("/api/v1/courses/{}/enrollments", course_id))
    }
}
