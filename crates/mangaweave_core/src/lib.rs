//! Core data types for mangaweave.
//!
//! These are the types exchanged with a generation driver: a request is a
//! list of multimodal [`Message`]s, a response is a list of [`Output`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;
mod media;
mod message;
mod output;
mod request;
mod role;
mod telemetry;

pub use input::Input;
pub use media::{ImageDetail, MediaSource};
pub use message::Message;
pub use output::Output;
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateRequestBuilderError, GenerateResponse,
};
pub use role::Role;
pub use telemetry::{LogFormat, init_tracing};
