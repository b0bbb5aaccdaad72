use crate::domain::model::{CourseId, DirectoryId, DirectoryUser, NewCourse, SourceRow};
use crate::utils::error::Result;
use async_trait::async_trait;

/// LMS 端的三個操作：建立課程、搜尋使用者、加入選課
#[async_trait]
pub trait LmsApi: Send + Sync {
    async fn create_course(&self, course: &NewCourse) -> Result<CourseId>;
    async fn search_users(&self, search_term: &str) -> Result<Vec<DirectoryUser>>;
    async fn enroll_teacher(&self, course_id: &CourseId, user_id: &DirectoryId) -> Result<()>;
    fn enrollments_endpoint(&self, course_id: &CourseId) -> String;
}

/// 課程申請的來源，依原始順序回傳所有列
#[async_trait]
pub trait RequestSource: Send + Sync {
    fn describe(&self) -> String;
    async fn read_rows(&self) -> Result<Vec<SourceRow>>;
}
