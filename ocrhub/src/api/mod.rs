mod dto;
mod extractors;
mod frontend;
mod handlers;
mod openapi;
mod routes;
mod state;

pub use dto::{LegacyOcrRequest, OcrJsonRequest, OcrUploadForm};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
