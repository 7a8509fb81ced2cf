mod auth;
pub use auth::{AUTH_HEADER, AUTH_TOKEN, extract_context_fn};
