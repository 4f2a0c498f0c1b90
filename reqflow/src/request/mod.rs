//! Request-side collaborators.
//!
//! This module provides:
//! - Call identity initializers and their getters
//! - Build-stage interceptors for common headers and body checks

mod content_length;
mod content_md5;
mod request_id;
mod service_operation;
mod user_agent;

pub use content_length::{ContentLengthBuilder, ContentLengthError};
pub use content_md5::{ContentMd5Builder, ContentMd5Error, CONTENT_MD5};
pub use request_id::{
    default_id_generator, IdGenerator, RequestIdBuilder, RequestIdError, X_REQUEST_ID,
};
pub use service_operation::{
    operation_name_from_context, operation_name_from_metadata, service_name_from_context,
    service_name_from_metadata, OperationNameKey, ServiceNameKey, ServiceOperationInitializer,
    WrapOperationErrorInitializer,
};
pub use user_agent::UserAgentBuilder;
