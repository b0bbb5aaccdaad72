use crate::core::{Diagnostic, EnrollmentRecord, LmsApi};
use crate::domain::model::{CourseId, DirectoryId};
use crate::utils::error::{ProvisionError, Result};

/// 以登入帳號查出目錄 ID，再把申請人加入課程成為教師
pub struct TeacherEnroller<'a, L: LmsApi + ?Sized> {
    lms: &'a L,
}

impl<'a, L: LmsApi + ?Sized> TeacherEnroller<'a, L> {
    pub fn new(lms: &'a L) -> Self {
        Self { lms }
    }

    /// 搜尋結果只取第一筆；沒有結果時回傳 `RequesterNotFound`
    pub async fn resolve(&self, login: &str) -> Result<DirectoryId> {
        let users = self.lms.search_users(login).await?;
        if users.len() > 1 {
            tracing::warn!(
                "⚠️ Search for '{}' matched {} users, using the first",
                login,
                users.len()
            );
        }

        users
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or_else(|| ProvisionError::RequesterNotFound {
                login: login.to_string(),
            })
    }

    pub async fn enroll(&self, user_id: &DirectoryId, course_id: &CourseId) -> Result<()> {
        self.lms.enroll_teacher(course_id, user_id).await
    }

    /// 查不到申請人就不嘗試加入選課
    pub async fn process(&self, record: &EnrollmentRecord) -> Diagnostic {
        let user_id = match self.resolve(&record.requester_login).await {
            Ok(user_id) => user_id,
            Err(e) => {
                return Diagnostic::RequesterNotResolved {
                    login: record.requester_login.clone(),
                    course_id: record.course_id.clone(),
                    reason: e.to_string(),
                }
            }
        };
        tracing::debug!(
            "Resolved '{}' to directory id {}",
            record.requester_login,
            user_id
        );

        match self.enroll(&user_id, &record.course_id).await {
            Ok(()) => Diagnostic::Enrolled {
                course_id: record.course_id.clone(),
                user_id,
            },
            Err(e) => {
                let status = match &e {
                    ProvisionError::HttpStatus { status, .. } => Some(*status),
                    _ => None,
                };
                Diagnostic::EnrollmentFailed {
                    endpoint: self.lms.enrollments_endpoint(&record.course_id),
                    status,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// 依 worklist 順序逐筆處理，一筆失敗不影響後面
    pub async fn process_all<F>(&self, worklist: Vec<EnrollmentRecord>, mut emit: F)
    where
        F: FnMut(Diagnostic),
    {
        for record in worklist {
            emit(self.process(&record).await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CanvasClient;
    use crate::config::CanvasConfig;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> CanvasClient {
        CanvasClient::new(&CanvasConfig {
            base_url: server.base_url(),
            token: "t".to_string(),
            account_id: "118".to_string(),
            enrollment_term_id: "42".to_string(),
            timeout_seconds: 5,
            concurrent_requests: 1,
        })
        .unwrap()
    }

    fn alice_c1() -> EnrollmentRecord {
        EnrollmentRecord {
            requester_login: "alice".to_string(),
            course_id: CourseId("C1".to_string()),
            course_name: "Biology".to_string(),
        }
    }

    #[tokio::test]
    async fn test_enrolls_resolved_directory_id_not_login() {
        let server = MockServer::start();
        let search_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/accounts/self/users")
                .query_param("search_term", "alice");
            then.status(200).json_body(serde_json::json!([{"id": "U9"}]));
        });
        let enroll_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/courses/C1/enrollments")
                .body_contains("enrollment%5Buser_id%5D=U9");
            then.status(200).json_body(serde_json::json!({"id": 1}));
        });
        let login_enroll_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/courses/C1/enrollments")
                .body_contains("enrollment%5Buser_id%5D=alice");
            then.status(200);
        });

        let client = client_for(&server);
        let diagnostic = TeacherEnroller::new(&client).process(&alice_c1()).await;

        search_mock.assert();
        enroll_mock.assert();
        login_enroll_mock.assert_hits(0);
        assert!(diagnostic.to_string().contains("C1"));
        assert_eq!(
            diagnostic,
            Diagnostic::Enrolled {
                course_id: CourseId("C1".to_string()),
                user_id: DirectoryId("U9".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_search_skips_enrollment() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/accounts/self/users");
            then.status(403);
        });
        let enroll_mock = server.mock(|when, then| {
            when.method(POST).path("/api/v1/courses/C1/enrollments");
            then.status(200);
        });

        let client = client_for(&server);
        let diagnostic = TeacherEnroller::new(&client).process(&alice_c1()).await;

        enroll_mock.assert_hits(0);
        assert!(matches!(diagnostic, Diagnostic::RequesterNotResolved { .. }));
    }

    #[tokio::test]
    async fn test_empty_search_is_requester_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/accounts/self/users");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = client_for(&server);
        let err = TeacherEnroller::new(&client).resolve("ghost").await.unwrap_err();

        assert!(matches!(err, ProvisionError::RequesterNotFound { login } if login == "ghost"));
    }

    #[tokio::test]
    async fn test_multiple_matches_use_first() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/accounts/self/users");
            then.status(200)
                .json_body(serde_json::json!([{"id": 11}, {"id": 12}]));
        });

        let client = client_for(&server);
        let user_id = TeacherEnroller::new(&client).resolve("sam").await.unwrap();
        assert_eq!(user_id, DirectoryId("11".to_string()));
    }

    #[tokio::test]
    async fn test_enrollment_failure_names_endpoint_and_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v1/accounts/self/users");
            then.status(200).json_body(serde_json::json!([{"id": "U9"}]));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/v1/courses/C1/enrollments");
            then.status(400);
        });

        let client = client_for(&server);
        let diagnostic = TeacherEnroller::new(&client).process(&alice_c1()).await;

        assert_eq!(
            diagnostic.to_string(),
            format!("{} returned 400", server.url("/api/v1/courses/C1/enrollments"))
        );
    }
}
