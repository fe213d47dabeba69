use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::UserService;
use crate::models::ApiResponse;

pub async fn get_user(
    service: &UserService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    Ok(match service.find_user(user_id, request).await? {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success(
            user,
            "User information retrieved successfully",
        )),
        Err(resp) => resp,
    })
}
