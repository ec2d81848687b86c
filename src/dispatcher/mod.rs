//! Method→handler registries and the typed-decode/dispatch/encode pipeline.
//!
//! Two registries, by method name: request handlers (produce a JSON-RPC
//! response) and notification handlers (fire-and-forget). Handler params
//! are decoded to the handler's typed request via [`registry::TypedRequestHandler`]
//! before the user's function ever runs, so a malformed payload never
//! reaches application code — it short-circuits to -32602.

pub mod error;
pub mod registry;

pub use error::DispatchError;
pub use registry::{
    Dispatcher, DispatcherConfig, HandlerError, NotificationHandler, RequestHandler,
    TypedNotificationHandler, TypedRequestHandler,
};
