use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::UserService;
use crate::errors::CourseforgeError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{current_user, error_response};

/// 管理员删除账号
///
/// 不能删除自己；账号仍关联存活选题时返回 409，需先退选。
pub async fn delete_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let admin = current_user(request)?;
    if admin.id == user_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::CanNotDeleteCurrentUser,
            "Cannot delete current user",
        )));
    }

    let storage = service.get_storage(request)?;
    match storage.delete_user(user_id).await {
        Ok(true) => {
            service.invalidate_user_cache(request).await;
            info!("Admin {} deleted user {}", admin.id, user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("User deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e @ CourseforgeError::Conflict(_)) => {
            warn!("Refused to delete user {}: {}", user_id, e.message());
            Ok(error_response(&e))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserDeleteFailed,
                format!("User deletion failed: {}", e.message()),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{HttpMessage, http::StatusCode, test::TestRequest, web};

    use crate::models::courseworks::{entities::DifficultyLevel, requests::CreateCourseworkRequest};
    use crate::models::subjects::requests::CreateSubjectRequest;
    use crate::models::users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    };
    use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

    async fn account(storage: &Arc<dyn Storage>, email: &str, role: UserRole) -> User {
        storage
            .create_user(CreateUserRequest {
                email: email.into(),
                password: "hashed".into(),
                first_name: "Nina".into(),
                last_name: "Park".into(),
                role,
            })
            .await
            .unwrap()
    }

    fn request_as(storage: &Arc<dyn Storage>, user: User) -> HttpRequest {
        let req = TestRequest::default()
            .app_data(web::Data::new(storage.clone()))
            .to_http_request();
        req.extensions_mut().insert(user);
        req
    }

    #[actix_web::test]
    async fn test_teacher_with_live_assignment_is_kept() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);
        let admin = account(&storage, "root@example.com", UserRole::Admin).await;
        let teacher = account(&storage, "t@example.com", UserRole::Teacher).await;
        let student = account(&storage, "s@example.com", UserRole::Student).await;
        let subject = storage
            .create_subject(CreateSubjectRequest {
                name: "Compilers".into(),
                code: "CC301".into(),
                description: None,
                semester: 6,
            })
            .await
            .unwrap();
        let cw = storage
            .create_coursework(
                teacher.id,
                CreateCourseworkRequest {
                    title: "Register allocation".into(),
                    description: "Implement linear-scan register allocation".into(),
                    requirements: None,
                    subject_id: subject.id,
                    teacher_id: None,
                    max_students: 2,
                    difficulty_level: DifficultyLevel::Hard,
                },
            )
            .await
            .unwrap();
        storage.create_assignment(student.id, cw.id).await.unwrap();

        let service = UserService::new_lazy();
        let resp = delete_user(&service, teacher.id, &request_as(&storage, admin.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(storage.get_user_by_id(teacher.id).await.unwrap().is_some());
        assert!(
            storage
                .get_assignment_by_student(student.id)
                .await
                .unwrap()
                .is_some()
        );

        let resp = delete_user(&service, admin.id, &request_as(&storage, admin.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
