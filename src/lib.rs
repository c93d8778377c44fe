pub mod app_state;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;

#[cfg(test)]
pub mod test_utils;
