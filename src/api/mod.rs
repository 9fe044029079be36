//! Envelope API over the binding core
//!
//! - messages: request structs and the `{code, message, success, data}` envelope
//! - handlers: one handler per method
//! - service: `ToolService`, the dispatcher the transport layer calls into

pub mod handlers;
pub mod messages;
pub mod service;

pub use messages::{
    ApiError, ApiRequest, ApiResponse, BindToolsRequest, BoundToolsRequest, ErrorCode, MembershipRequest,
    UnboundToolsRequest, methods,
};
pub use service::ToolService;
