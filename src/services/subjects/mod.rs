pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod teachers;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::subjects::requests::{
    AddSubjectTeacherRequest, CreateSubjectRequest, SetLeadTeacherRequest, SubjectListQuery,
    UpdateSubjectRequest,
};
use crate::storage::Storage;

pub struct SubjectService {
    storage: Option<Arc<dyn Storage>>,
}

impl SubjectService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from(&self.storage, request)
    }

    pub async fn list_subjects(
        &self,
        query: SubjectListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_subjects(self, query, request).await
    }

    pub async fn get_subject(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        get::get_subject(self, id, request).await
    }

    pub async fn create_subject(
        &self,
        body: CreateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_subject(self, body, request).await
    }

    pub async fn update_subject(
        &self,
        id: i64,
        body: UpdateSubjectRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_subject(self, id, body, request).await
    }

    pub async fn delete_subject(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        delete::delete_subject(self, id, request).await
    }

    // 学科教师名单
    pub async fn list_teachers(&self, id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        teachers::list_teachers(self, id, request).await
    }

    pub async fn add_teacher(
        &self,
        id: i64,
        body: AddSubjectTeacherRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        teachers::add_teacher(self, id, body, request).await
    }

    pub async fn remove_teacher(
        &self,
        id: i64,
        teacher_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        teachers::remove_teacher(self, id, teacher_id, request).await
    }

    pub async fn set_lead_teacher(
        &self,
        id: i64,
        body: SetLeadTeacherRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        teachers::set_lead_teacher(self, id, body, request).await
    }
}
