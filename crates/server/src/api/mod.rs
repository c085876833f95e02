pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod streams;
pub mod videos;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
