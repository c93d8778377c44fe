pub mod auth_state;

pub use auth_state::{AuthSnapshot, AuthState, SubscriptionId};
