pub mod api_client;
pub mod auth_service;
pub mod navigation;

pub use api_client::ApiClient;
pub use auth_service::AuthService;
pub use navigation::{HistoryNavigator, Navigator};
