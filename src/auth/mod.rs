pub mod claims;
pub mod guard;
pub mod token;

pub use claims::{TokenClaims, TokenIdentity};
pub use guard::{evaluate, NavigationDecision, RouterGuard};
pub use token::{decode_claims, decode_expiry, is_token_valid, is_token_valid_at};
