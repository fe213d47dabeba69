pub mod available;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::CourseforgeError;
use crate::models::courseworks::entities::Coursework;
use crate::models::courseworks::requests::{
    AvailableCourseworkParams, CourseworkListParams, CreateCourseworkRequest,
    SetAvailabilityRequest, UpdateCourseworkRequest,
};
use crate::models::users::entities::User;
use crate::services::assignments::ensure_teacher_of;
use crate::storage::Storage;

pub struct CourseworkService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseworkService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from(&self.storage, request)
    }

    pub async fn list_courseworks(
        &self,
        query: CourseworkListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_courseworks(self, query, request).await
    }

    pub async fn list_available(
        &self,
        query: AvailableCourseworkParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        available::list_available(self, query, request).await
    }

    pub async fn get_coursework(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_coursework(self, id, request).await
    }

    pub async fn create_coursework(
        &self,
        body: CreateCourseworkRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_coursework(self, body, request).await
    }

    pub async fn update_coursework(
        &self,
        id: i64,
        body: UpdateCourseworkRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_coursework(self, id, body, request).await
    }

    pub async fn set_availability(
        &self,
        id: i64,
        body: SetAvailabilityRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::set_availability(self, id, body, request).await
    }

    pub async fn delete_coursework(
        &self,
        id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        delete::delete_coursework(self, id, request).await
    }
}

/// 读取课题并确认调用者是所属教师或管理员
pub(crate) async fn load_owned(
    storage: &dyn Storage,
    user: &User,
    id: i64,
) -> Result<Coursework, CourseforgeError> {
    let coursework = storage
        .get_coursework_by_id(id)
        .await?
        .ok_or_else(|| CourseforgeError::not_found(format!("Coursework {id} not found")))?;
    ensure_teacher_of(user, coursework.teacher_id)?;
    Ok(coursework)
}

/// 课题引用的学科必须存在
pub(crate) async fn ensure_subject_exists(
    storage: &dyn Storage,
    subject_id: i64,
) -> Result<(), CourseforgeError> {
    match storage.get_subject_by_id(subject_id).await? {
        Some(_) => Ok(()),
        None => Err(CourseforgeError::not_found(format!(
            "Subject {subject_id} not found"
        ))),
    }
}
