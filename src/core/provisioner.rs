use crate::config::CanvasConfig;
use crate::core::{CourseRequest, Diagnostic, EnrollmentRecord, LmsApi};
use crate::domain::model::NewCourse;
use crate::utils::error::{ProvisionError, Result};
use futures::stream::{self, StreamExt};

/// 建立沙盒課程；成功的申請進入 worklist，失敗的只留下一行診斷
pub struct CourseProvisioner<'a, L: LmsApi + ?Sized> {
    lms: &'a L,
    canvas: &'a CanvasConfig,
}

impl<'a, L: LmsApi + ?Sized> CourseProvisioner<'a, L> {
    pub fn new(lms: &'a L, canvas: &'a CanvasConfig) -> Self {
        Self { lms, canvas }
    }

    pub fn new_course(&self, request: &CourseRequest) -> NewCourse {
        NewCourse {
            name: request.course_name.clone(),
            course_code: request.course_code().to_string(),
            account_id: self.canvas.account_id.clone(),
            enrollment_term_id: self.canvas.enrollment_term_id.clone(),
        }
    }

    pub async fn provision(&self, request: &CourseRequest) -> Result<EnrollmentRecord> {
        let course = self.new_course(request);
        let course_id = self.lms.create_course(&course).await?;

        Ok(EnrollmentRecord {
            requester_login: request.requester_login.clone(),
            course_id,
            course_name: request.course_name.clone(),
        })
    }

    /// 每筆申請只呼叫一次建立課程；`buffered` 保持輸入順序，所以 worklist 依來源順序排列
    pub async fn provision_all<F>(
        &self,
        requests: Vec<CourseRequest>,
        concurrency: usize,
        mut emit: F,
    ) -> Vec<EnrollmentRecord>
    where
        F: FnMut(Diagnostic),
    {
        let mut worklist = Vec::with_capacity(requests.len());
        let mut outcomes = stream::iter(requests)
            .map(move |request| async move {
                let outcome = self.provision(&request).await;
                (request, outcome)
            })
            .buffered(concurrency.max(1));

        while let Some((request, outcome)) = outcomes.next().await {
            match outcome {
                Ok(record) => {
                    emit(Diagnostic::CourseCreated {
                        course_id: record.course_id.clone(),
                        requester_login: record.requester_login.clone(),
                    });
                    worklist.push(record);
                }
                Err(e) => emit(creation_failure(&request, e)),
            }
        }

        worklist
    }
}

fn creation_failure(request: &CourseRequest, error: ProvisionError) -> Diagnostic {
    let status = match &error {
        ProvisionError::HttpStatus { status, .. } => Some(*status),
        _ => None,
    };
    Diagnostic::CourseCreationFailed {
        course_name: request.course_name.clone(),
        status,
        reason: error.to_string(),
    }
}
