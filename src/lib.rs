//! Backend service client for the Undertone DAW plugin.
//!
//! The plugin UI submits generation, extension, transformation, and undo jobs
//! to a remote model-serving backend and receives results asynchronously. This
//! crate owns everything between the UI event and the finished audio: request
//! encoding, the HTTP transport, response decoding, and the polling state
//! machine that tracks the single in-flight session.
//!
//! The UI drives the client through [`ClientHandle`] and consumes
//! [`ClientEvent`]s from the channel returned by [`spawn`]. All events for one
//! operation arrive in order: zero or more status/progress updates, then
//! exactly one terminal delivery (audio plus completion, or an error).
//! Cancellation delivers a single status line and nothing else.

mod client;
mod config;
mod request;
mod response;
mod transport;
mod types;

pub use client::{spawn, ClientHandle, Command};
pub use config::ClientConfig;
pub use request::{EncodedRequest, MODEL_NAMES, VARIATIONS};
pub use response::{decode_poll, decode_submit, PollDecision, SubmitDecision};
pub use transport::{Backend, HttpBackend, RawResponse, TransportOutcome};
pub use types::{
    ClientEvent, ExtendParams, GenerateParams, LoopType, OperationKind, TransformParams,
    UndoParams,
};
