use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::errors::CourseforgeError;
use crate::models::{ApiResponse, users::entities::UserRole};
use crate::services::error_response;

/// 教师所在学科；目标账号不是教师时返回 400
pub async fn list_teacher_subjects(
    service: &UserService,
    teacher_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let teacher = match service.find_user(teacher_id, request).await? {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };
    if teacher.role != UserRole::Teacher {
        return Ok(error_response(&CourseforgeError::validation(format!(
            "User {teacher_id} is not a teacher"
        ))));
    }

    let storage = service.get_storage(request)?;
    match storage.list_subjects_by_teacher(teacher_id).await {
        Ok(subjects) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            subjects,
            "Teacher subjects retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test::TestRequest, web};

    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::requests::CreateUserRequest;
    use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

    async fn account(storage: &Arc<dyn Storage>, email: &str, role: UserRole) -> i64 {
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
            .id
    }

    #[actix_web::test]
    async fn test_subjects_listed_for_teachers_only() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let teacher = account(&storage, "berg@example.com", UserRole::Teacher).await;
        let student = account(&storage, "pupil@example.com", UserRole::Student).await;
        let subject = storage
            .create_subject(CreateSubjectRequest {
                name: "Networks".into(),
                code: "NET220".into(),
                description: None,
                semester: 5,
            })
            .await
            .unwrap();
        storage.add_subject_teacher(subject.id, teacher, true).await.unwrap();

        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        let service = UserService::new_lazy();

        let resp = list_teacher_subjects(&service, teacher, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = list_teacher_subjects(&service, student, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = list_teacher_subjects(&service, teacher + 999, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
