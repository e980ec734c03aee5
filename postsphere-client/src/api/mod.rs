mod client;
mod error;

pub use client::{ApiClient, NewPost, Thumbnail};
pub use error::{ApiError, ApiResult};
