use crate::config::CanvasConfig;
use crate::core::enroller::TeacherEnroller;
use crate::core::provisioner::CourseProvisioner;
use crate::core::{CourseRequest, Diagnostic, LmsApi, RequestSource, RunReport};
use crate::domain::model::SourceRow;
use crate::utils::error::Result;

/// 讀取申請 → 建立課程 → 查詢並加入教師
pub struct SandboxPipeline<L: LmsApi> {
    lms: L,
    canvas: CanvasConfig,
}

impl<L: LmsApi> SandboxPipeline<L> {
    pub fn new(lms: L, canvas: CanvasConfig) -> Self {
        Self { lms, canvas }
    }

    /// 只有讀取來源失敗會回傳錯誤，單筆記錄的失敗都記在報告中
    pub async fn run<R: RequestSource + ?Sized>(&self, source: &R) -> Result<RunReport> {
        let mut report = RunReport::default();

        tracing::info!("📥 Reading course requests from {}", source.describe());
        let rows = source.read_rows().await?;
        report.requested = rows.len();
        tracing::info!("📋 {} course requests found", rows.len());

        let requests = normalize(&rows, |d| emit(&mut report, d));

        tracing::info!(
            "🏗️ Creating {} courses ({} at a time)",
            requests.len(),
            self.canvas.concurrent_requests
        );
        let provisioner = CourseProvisioner::new(&self.lms, &self.canvas);
        let worklist = provisioner
            .provision_all(requests, self.canvas.concurrent_requests, |d| {
                emit(&mut report, d)
            })
            .await;

        tracing::info!("👩‍🏫 Enrolling {} requesters", worklist.len());
        let enroller = TeacherEnroller::new(&self.lms);
        enroller
            .process_all(worklist, |d| emit(&mut report, d))
            .await;

        tracing::info!(
            "✅ Run finished: {} requested, {} created, {} enrolled, {} failures",
            report.requested,
            report.created,
            report.enrolled.len(),
            report.failures()
        );
        Ok(report)
    }

    /// Dry run：只解析申請，不呼叫 LMS
    pub async fn plan<R: RequestSource + ?Sized>(&self, source: &R) -> Result<Vec<CourseRequest>> {
        let rows = source.read_rows().await?;
        Ok(normalize(&rows, |d| {
            tracing::warn!("⚠️ {}", d);
        }))
    }
}

fn normalize<F>(rows: &[SourceRow], mut emit: F) -> Vec<CourseRequest>
where
    F: FnMut(Diagnostic),
{
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| match CourseRequest::from_row(row) {
            Ok(request) => Some(request),
            Err(e) => {
                emit(Diagnostic::RequestRejected {
                    reason: format!("row {}: {}", index + 1, e),
                });
                None
            }
        })
        .collect()
}

fn emit(report: &mut RunReport, diagnostic: Diagnostic) {
    if diagnostic.is_failure() {
        tracing::warn!("{}", diagnostic);
    } else {
        tracing::debug!("{}", diagnostic);
    }
    if !matches!(diagnostic, Diagnostic::CourseCreated { .. }) {
        println!("{}", diagnostic);
    }
    report.record(diagnostic);
}
