pub mod request;
pub mod response;

pub use request::{LoginRequest, RegisterRequest};
pub use response::{LoginResponse, ValidateResponse};
