pub mod http;
pub mod params;

pub use http::{AppState, HttpServer};
