//! API layer - HTTP exchange with the LangConnect service
//!
//! Requests are described by [`request::RequestSpec`], sent by
//! [`client::ApiClient::dispatch`], and come back as a
//! [`response::ResponseEnvelope`] or a classified error.

pub mod client;
pub mod models;
pub mod request;
pub mod response;
