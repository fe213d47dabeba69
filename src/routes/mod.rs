//! HTTP 路由，全部挂在 `/api/v1` 下

pub mod assignments;
pub mod auth;
pub mod courseworks;
pub mod subjects;
pub mod system;
pub mod users;

use actix_web::web;

pub use assignments::configure_assignment_routes;
pub use auth::configure_auth_routes;
pub use courseworks::configure_coursework_routes;
pub use subjects::configure_subject_routes;
pub use system::configure_system_routes;
pub use users::configure_user_routes;

/// 注册全部 API 路由
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_user_routes)
        .configure(configure_subject_routes)
        .configure(configure_coursework_routes)
        .configure(configure_assignment_routes)
        .configure(configure_system_routes);
}
