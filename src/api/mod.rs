pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use routes::create_router;
pub use server::PredictionServer;
pub use types::{ApiError, ErrorBody};
