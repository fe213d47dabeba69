pub mod enroll;
pub mod query;
pub mod transitions;
pub mod unassign;
pub mod workflow;

pub use workflow::AssignmentWorkflow;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::CourseforgeError;
use crate::models::assignments::entities::AssignmentDetail;
use crate::models::assignments::requests::{
    AssignRequest, CanAssignQuery, GradeRequest, TeachingAssignmentsQuery, UpdateStatusRequest,
};
use crate::models::users::entities::User;
use crate::storage::Storage;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from(&self.storage, request)
    }

    pub(crate) fn workflow(&self, request: &HttpRequest) -> ActixResult<AssignmentWorkflow> {
        Ok(AssignmentWorkflow::new(
            self.get_storage(request)?,
            AppConfig::get().operation_deadline(),
        ))
    }

    // 选题
    pub async fn assign(
        &self,
        coursework_id: i64,
        body: AssignRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enroll::assign(self, coursework_id, body, request).await
    }

    // 选题预检
    pub async fn can_assign(
        &self,
        coursework_id: i64,
        query: CanAssignQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enroll::can_assign(self, coursework_id, query, request).await
    }

    // 课题进度
    pub async fn progress(
        &self,
        coursework_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        query::progress(self, coursework_id, request).await
    }

    // 我的选题
    pub async fn my_assignment(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        query::my_assignment(self, request).await
    }

    // 教师名下的选题
    pub async fn teaching(
        &self,
        query: TeachingAssignmentsQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        query::teaching(self, query, request).await
    }

    // 学生自行退选
    pub async fn unassign_self(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        unassign::unassign_self(self, request).await
    }

    // 教师或管理员退选学生
    pub async fn unassign_student(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        unassign::unassign_student(self, student_id, request).await
    }

    pub async fn submit(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        transitions::submit(self, id, request).await
    }

    pub async fn grade(
        &self,
        id: i64,
        body: GradeRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transitions::grade(self, id, body, request).await
    }

    pub async fn complete(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        transitions::complete(self, id, request).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        body: UpdateStatusRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        transitions::update_status(self, id, body, request).await
    }
}

/// 课题所属教师或管理员
pub(crate) fn ensure_teacher_of(user: &User, teacher_id: i64) -> Result<(), CourseforgeError> {
    if user.is_admin() || (user.is_teacher() && user.id == teacher_id) {
        Ok(())
    } else {
        Err(CourseforgeError::authorization(
            "Only the coursework owner or an administrator may do this",
        ))
    }
}

/// 选题所属学生或管理员
pub(crate) fn ensure_student_of(
    user: &User,
    detail: &AssignmentDetail,
) -> Result<(), CourseforgeError> {
    if user.is_admin() || user.id == detail.assignment.student_id {
        Ok(())
    } else {
        Err(CourseforgeError::authorization(
            "Only the assigned student or an administrator may do this",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;

    fn user(id: i64, role: UserRole) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            email: format!("u{id}@example.com"),
            password_hash: String::new(),
            first_name: "U".into(),
            last_name: "Ser".into(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_teacher_ownership() {
        assert!(ensure_teacher_of(&user(3, UserRole::Teacher), 3).is_ok());
        assert!(ensure_teacher_of(&user(1, UserRole::Admin), 3).is_ok());
        assert!(matches!(
            ensure_teacher_of(&user(4, UserRole::Teacher), 3),
            Err(CourseforgeError::Authorization(_))
        ));
        // 学生即使 id 相同也不能操作
        assert!(ensure_teacher_of(&user(3, UserRole::Student), 3).is_err());
    }
}
