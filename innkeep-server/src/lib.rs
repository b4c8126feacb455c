//! innkeep-server: HTTP API for a hotel-booking backend
//!
//! Two resource groups share one Postgres pool:
//! - the hotel and room catalog, with room image uploads
//! - customer support chat: requests, messages, read tracking and a
//!   live event stream per request

pub mod db;
pub mod events;
pub mod http;
pub mod models;
pub mod uploads;

pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
