pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;

pub use backend::{
    AskRequest, AudioUpload, Backend, ByteStream, PdfUpload, StatusResponse, StopRequest,
};
pub use config::{ClientConfig, DisplayStyle};
pub use controller::{QueryController, QueryReport, NO_CONTEXT_MESSAGE};
pub use error::{BackendError, QueryError, Result};
pub use http::HttpBackend;
