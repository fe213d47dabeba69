use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseworkService;
use crate::models::{
    ApiResponse,
    courseworks::{requests::AvailableCourseworkParams, responses::AvailableCoursework},
};
use crate::services::error_response;

pub async fn list_available(
    service: &CourseworkService,
    query: AvailableCourseworkParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.list_available_courseworks(query.subject_id).await {
        Ok(rows) => {
            let items: Vec<AvailableCoursework> = rows
                .into_iter()
                .map(|(cw, enrolled)| AvailableCoursework::new(cw, enrolled))
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                items,
                "Available courseworks retrieved",
            )))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
