use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseworkService;
use crate::models::{
    ApiResponse,
    courseworks::requests::{CourseworkListParams, CourseworkListQuery},
};
use crate::services::error_response;

pub async fn list_courseworks(
    service: &CourseworkService,
    query: CourseworkListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage
        .list_courseworks_with_pagination(CourseworkListQuery::from(query))
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Coursework list retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
