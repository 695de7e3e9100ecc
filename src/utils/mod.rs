/// Reads the configuration of the API from files and the environment
pub mod config;
/// All the constants used by the API
pub mod constants;
/// Extractors that read what the gate put in the request
pub mod extractors;
/// The [`tower::Layer`]s that authenticate and authorize requests
pub mod layers;
/// Installs the tracing subscriber
pub mod logger;
/// Helpers to mount gated routes on an [`axum::Router`]
mod router_ext;

pub use self::router_ext::*;
