pub mod requests;
pub mod responses;

pub use requests::{ChangePasswordRequest, LoginRequest, RegisterRequest};
pub use responses::{LoginResponse, RefreshTokenResponse};
