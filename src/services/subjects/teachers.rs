use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::SubjectService;
use crate::errors::{CourseforgeError, Result};
use crate::models::{
    ApiResponse,
    subjects::{
        entities::SubjectTeacher,
        requests::{AddSubjectTeacherRequest, SetLeadTeacherRequest},
    },
    users::entities::UserRole,
};
use crate::services::error_response;
use crate::storage::Storage;

async fn require_subject(storage: &Arc<dyn Storage>, subject_id: i64) -> Result<()> {
    match storage.get_subject_by_id(subject_id).await? {
        Some(_) => Ok(()),
        None => Err(CourseforgeError::not_found(format!(
            "Subject {subject_id} not found"
        ))),
    }
}

// 名单里只能放教师账号
async fn require_teacher(storage: &Arc<dyn Storage>, teacher_id: i64) -> Result<()> {
    match storage.get_user_by_id(teacher_id).await? {
        Some(user) if user.role == UserRole::Teacher => Ok(()),
        Some(_) => Err(CourseforgeError::validation(format!(
            "User {teacher_id} is not a teacher"
        ))),
        None => Err(CourseforgeError::not_found(format!(
            "Teacher {teacher_id} not found"
        ))),
    }
}

pub async fn list_teachers(
    service: &SubjectService,
    subject_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let roster: Result<Vec<SubjectTeacher>> = async {
        require_subject(&storage, subject_id).await?;
        storage.list_subject_teachers(subject_id).await
    }
    .await;

    match roster {
        Ok(roster) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            roster,
            "Subject teachers retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn add_teacher(
    service: &SubjectService,
    subject_id: i64,
    body: AddSubjectTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let roster: Result<Vec<SubjectTeacher>> = async {
        require_subject(&storage, subject_id).await?;
        require_teacher(&storage, body.teacher_id).await?;
        storage
            .add_subject_teacher(subject_id, body.teacher_id, body.is_lead)
            .await?;
        storage.list_subject_teachers(subject_id).await
    }
    .await;

    match roster {
        Ok(roster) => {
            info!(
                "Teacher {} added to subject {} (lead: {})",
                body.teacher_id, subject_id, body.is_lead
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(roster, "Teacher added to subject")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn remove_teacher(
    service: &SubjectService,
    subject_id: i64,
    teacher_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.remove_subject_teacher(subject_id, teacher_id).await {
        Ok(true) => {
            info!("Teacher {} removed from subject {}", teacher_id, subject_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Teacher removed from subject")))
        }
        Ok(false) => Ok(error_response(&CourseforgeError::not_found(format!(
            "Teacher {teacher_id} is not on subject {subject_id}"
        )))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn set_lead_teacher(
    service: &SubjectService,
    subject_id: i64,
    body: SetLeadTeacherRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let roster: Result<Vec<SubjectTeacher>> = async {
        if !storage
            .set_subject_lead_teacher(subject_id, body.teacher_id)
            .await?
        {
            return Err(CourseforgeError::not_found(format!(
                "Teacher {} is not on subject {subject_id}",
                body.teacher_id
            )));
        }
        storage.list_subject_teachers(subject_id).await
    }
    .await;

    match roster {
        Ok(roster) => {
            info!("Teacher {} is now lead of subject {}", body.teacher_id, subject_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(roster, "Lead teacher updated")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::{http::StatusCode, test::TestRequest, web};

    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::{entities::User, requests::CreateUserRequest};
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    async fn account(storage: &Arc<dyn Storage>, email: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                email: email.into(),
                password: "hashed".into(),
                first_name: "Ola".into(),
                last_name: "Berg".into(),
                role,
            })
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn test_roster_endpoints() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let first = account(&storage, "a@example.com", UserRole::Teacher).await;
        let second = account(&storage, "b@example.com", UserRole::Teacher).await;
        let student = account(&storage, "s@example.com", UserRole::Student).await;
        let subject = storage
            .create_subject(CreateSubjectRequest {
                name: "Databases".into(),
                code: "DB210".into(),
                description: None,
                semester: 3,
            })
            .await
            .unwrap();
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        let service = SubjectService::new_lazy();
        let add = |teacher_id, is_lead| AddSubjectTeacherRequest { teacher_id, is_lead };

        let resp = add_teacher(&service, subject.id, add(first.id, true), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = add_teacher(&service, subject.id, add(first.id, false), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = add_teacher(&service, subject.id, add(student.id, false), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = add_teacher(&service, subject.id + 50, add(second.id, false), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let lead = |teacher_id| SetLeadTeacherRequest { teacher_id };
        let resp = set_lead_teacher(&service, subject.id, lead(second.id), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        add_teacher(&service, subject.id, add(second.id, false), &req).await.unwrap();
        let resp = set_lead_teacher(&service, subject.id, lead(second.id), &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let roster = storage.list_subject_teachers(subject.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster[0].is_lead && roster[0].teacher.id == second.id);
        assert!(!roster[1].is_lead);

        let resp = remove_teacher(&service, subject.id, first.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let resp = remove_teacher(&service, subject.id, first.id, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
