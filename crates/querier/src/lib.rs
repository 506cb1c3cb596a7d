pub mod access;
pub mod error;
pub mod http;
pub mod normalize;

pub use access::{AccessResolver, AllowAll};
pub use error::HttpError;
pub use http::HttpHandler;
