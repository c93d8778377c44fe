//! Key-value storage the session lives in.
//!
//! Same contract as browser `localStorage`: string
//! keys, string values, synchronous, no error channel. Backends log their own
//! I/O failures.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "userRole";
pub const USER_DATA_KEY: &str = "userData";
pub const LOGIN_TIME_KEY: &str = "loginTime";

/// Every key the session occupies.
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, ROLE_KEY, USER_DATA_KEY, LOGIN_TIME_KEY];

#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}
