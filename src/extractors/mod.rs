pub mod api_key;
pub use api_key::{ApiKey, API_KEY_PARAM};
