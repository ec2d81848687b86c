//! Method registries and the typed handler adapter.
//!
//! A [`Dispatcher`] holds two concurrent registries, by method name:
//! request handlers (produce a result or a [`HandlerError`]) and
//! notification handlers (fire-and-forget). Both operate on raw
//! [`serde_json::Value`] params/results at this layer; [`TypedRequestHandler`]
//! and [`TypedNotificationHandler`] adapt a strongly-typed async closure
//! into the `Value`-based trait object the registry stores, performing the
//! decode/encode step so individual handlers can work in their own types.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

use super::error::DispatchError;

/// Error a user-supplied handler may return. If `code` is set it is
/// preserved verbatim on the wire (a recognized ACP error, e.g. capability
/// missing); otherwise the dispatcher wraps `message` as -32603.
#[derive(Debug, Clone)]
pub struct HandlerError {
    pub code: Option<i64>,
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Raw, `Value`-based request handler as stored in the registry.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>) -> Result<Value, HandlerError>;
}

/// Raw, `Value`-based notification handler as stored in the registry.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn handle(&self, params: Option<Value>);
}

/// Adapts a strongly-typed async function `Fn(Req) -> Fut<Result<Res, HandlerError>>`
/// into a [`RequestHandler`], decoding `params` to `Req` and encoding the
/// response back to `Value`. A decode failure becomes an -32602 before the
/// inner function ever runs.
pub struct TypedRequestHandler<Req, Res, F> {
    method: String,
    func: F,
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res, F, Fut> TypedRequestHandler<Req, Res, F>
where
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, HandlerError>> + Send,
{
    pub fn new(method: impl Into<String>, func: F) -> Self {
        Self {
            method: method.into(),
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, Res, F, Fut> RequestHandler for TypedRequestHandler<Req, Res, F>
where
    Req: DeserializeOwned + Send + 'static,
    Res: Serialize + Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, HandlerError>> + Send,
{
    async fn handle(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let params = params.unwrap_or(Value::Null);
        let request: Req = serde_json::from_value(params).map_err(|err| {
            HandlerError::with_code(
                crate::schema::JsonRpcError::INVALID_PARAMS,
                format!("invalid params for '{}': {err}", self.method),
            )
        })?;
        let response = (self.func)(request).await?;
        serde_json::to_value(response).map_err(|err| {
            HandlerError::new(format!(
                "failed to serialize result of '{}': {err}",
                self.method
            ))
        })
    }
}

/// Adapts a strongly-typed async function `Fn(Notif) -> Fut<()>` into a
/// [`NotificationHandler`]. Decode failures are logged and dropped —
/// notifications never produce a response, so there is nowhere to report
/// an error.
pub struct TypedNotificationHandler<Notif, F> {
    method: String,
    func: F,
    _marker: PhantomData<fn(Notif)>,
}

impl<Notif, F, Fut> TypedNotificationHandler<Notif, F>
where
    Notif: DeserializeOwned + Send + 'static,
    F: Fn(Notif) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    pub fn new(method: impl Into<String>, func: F) -> Self {
        Self {
            method: method.into(),
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Notif, F, Fut> NotificationHandler for TypedNotificationHandler<Notif, F>
where
    Notif: DeserializeOwned + Send + 'static,
    F: Fn(Notif) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, params: Option<Value>) {
        let params = params.unwrap_or(Value::Null);
        match serde_json::from_value::<Notif>(params) {
            Ok(notification) => (self.func)(notification).await,
            Err(err) => warn!(
                target: "acp_core::dispatcher",
                method = %self.method,
                %err,
                "dropping notification with unparsable params"
            ),
        }
    }
}

/// Tunables for [`Dispatcher`] construction.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Whether unhandled requests log at `warn` (they always still produce
    /// an error response; this only controls local diagnostics).
    pub log_unhandled: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            log_unhandled: true,
        }
    }
}

/// Method-name-keyed registries for request and notification handlers, plus
/// the routing logic that turns a decoded [`JsonRpcRequest`]/
/// [`JsonRpcNotification`] into handler invocation and (for requests) a
/// [`JsonRpcResponse`].
///
/// Registries are `DashMap`s rather than a `HashMap` behind a lock: they are
/// built once at endpoint construction and read-only afterwards, so
/// concurrent reads dominate and a lock-free map avoids contention even
/// during that initial registration burst.
pub struct Dispatcher {
    request_handlers: DashMap<String, Arc<dyn RequestHandler>>,
    notification_handlers: DashMap<String, Arc<dyn NotificationHandler>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            request_handlers: DashMap::new(),
            notification_handlers: DashMap::new(),
            config,
        }
    }

    /// Register a request handler for `method`. Returns an error if one is
    /// already registered — registries are meant to be built once at
    /// startup, not mutated concurrently with dispatch.
    pub fn register_request(
        &self,
        method: impl Into<String>,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<(), DispatchError> {
        let method = method.into();
        if self.request_handlers.contains_key(&method) {
            return Err(DispatchError::DuplicateRegistration { method });
        }
        self.request_handlers.insert(method, handler);
        Ok(())
    }

    /// Register a notification handler for `method`.
    pub fn register_notification(
        &self,
        method: impl Into<String>,
        handler: Arc<dyn NotificationHandler>,
    ) -> Result<(), DispatchError> {
        let method = method.into();
        if self.notification_handlers.contains_key(&method) {
            return Err(DispatchError::DuplicateRegistration { method });
        }
        self.notification_handlers.insert(method, handler);
        Ok(())
    }

    pub fn has_request_handler(&self, method: &str) -> bool {
        self.request_handlers.contains_key(method)
    }

    pub fn has_notification_handler(&self, method: &str) -> bool {
        self.notification_handlers.contains_key(method)
    }

    /// Route a decoded request to its handler and build the response.
    /// Missing handler -> -32601 with a method-specific hint; handler
    /// success -> `result`; handler failure -> the handler's own code if it
    /// set one, else -32603.
    pub async fn dispatch_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let handler = self.request_handlers.get(&request.method).map(|entry| entry.value().clone());
        let Some(handler) = handler else {
            if self.config.log_unhandled {
                warn!(target: "acp_core::dispatcher", method = %request.method, "no request handler registered");
            }
            let error = DispatchError::MethodNotFound {
                method: request.method.clone(),
            }
            .to_jsonrpc_error();
            return JsonRpcResponse::error(error, Some(request.id));
        };

        debug!(target: "acp_core::dispatcher", method = %request.method, "dispatching request");
        match handler.handle(request.params).await {
            Ok(result) => JsonRpcResponse::success(result, request.id),
            Err(handler_error) => {
                let error = match handler_error.code {
                    Some(code) => crate::schema::JsonRpcError::new(code, handler_error.message),
                    None => crate::schema::JsonRpcError::internal_error(handler_error.message),
                };
                JsonRpcResponse::error(error, Some(request.id))
            }
        }
    }

    /// Route a decoded notification to its handler, if any. A missing
    /// handler is silently dropped (after an optional log line) —
    /// notifications never produce a response regardless of whether a
    /// handler exists.
    pub async fn dispatch_notification(&self, notification: JsonRpcNotification) {
        let handler = self
            .notification_handlers
            .get(&notification.method)
            .map(|entry| entry.value().clone());
        match handler {
            Some(handler) => {
                debug!(target: "acp_core::dispatcher", method = %notification.method, "dispatching notification");
                handler.handle(notification.params).await;
            }
            None => {
                if self.config.log_unhandled {
                    warn!(target: "acp_core::dispatcher", method = %notification.method, "no notification handler registered");
                }
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("request_methods", &self.request_handlers.len())
            .field("notification_methods", &self.notification_handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RequestId;
    use serde_json::json;

    #[tokio::test]
    async fn missing_request_handler_yields_method_not_found() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default());
        let request = JsonRpcRequest::new("initialize", None, RequestId::new_number(1));
        let response = dispatcher.dispatch_request(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn typed_handler_decodes_and_encodes() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default());
        dispatcher
            .register_request(
                "echo",
                Arc::new(TypedRequestHandler::new("echo", |req: String| async move {
                    Ok::<_, HandlerError>(req)
                })),
            )
            .unwrap();

        let request = JsonRpcRequest::new(
            "echo",
            Some(json!("hello")),
            RequestId::new_string("r1"),
        );
        let response = dispatcher.dispatch_request(request).await;
        assert_eq!(response.result.unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn invalid_params_yield_dash_32602() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default());
        dispatcher
            .register_request(
                "needs_object",
                Arc::new(TypedRequestHandler::new(
                    "needs_object",
                    |_req: std::collections::BTreeMap<String, i32>| async move {
                        Ok::<_, HandlerError>(())
                    },
                )),
            )
            .unwrap();

        let request = JsonRpcRequest::new(
            "needs_object",
            Some(json!("not an object")),
            RequestId::new_number(2),
        );
        let response = dispatcher.dispatch_request(request).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default());
        dispatcher
            .register_request(
                "dup",
                Arc::new(TypedRequestHandler::new("dup", |_req: ()| async move {
                    Ok::<_, HandlerError>(())
                })),
            )
            .unwrap();
        let result = dispatcher.register_request(
            "dup",
            Arc::new(TypedRequestHandler::new("dup", |_req: ()| async move {
                Ok::<_, HandlerError>(())
            })),
        );
        assert!(matches!(
            result,
            Err(DispatchError::DuplicateRegistration { .. })
        ));
    }

    #[tokio::test]
    async fn unhandled_notification_is_silently_dropped() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default());
        let notification = JsonRpcNotification::new("session/cancel", None);
        dispatcher.dispatch_notification(notification).await;
    }
}
