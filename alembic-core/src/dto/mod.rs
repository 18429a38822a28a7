//! Data Transfer Objects
//!
//! Wire records exchanged with the external inference service, for both
//! the asynchronous batch endpoint and the per-item endpoint.

pub mod batch;

pub use batch::{
    InferenceResponse, OutputContent, OutputItem, PromptMessage, RequestBody, RequestRecord,
    ResultRecord,
};
