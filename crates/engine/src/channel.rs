//! Response channel – the single request/response endpoint a host invokes.
//!
//! Every call to [`ResponseChannel::handle`] ends in exactly one
//! [`MethodResult`] callback. The callbacks consume the sink, so a second
//! invocation does not type-check.

use crate::context::AppContext;
use crate::dispatcher::QueryDispatcher;
use crate::types::*;
use serde_json::Value;
use tokio::sync::oneshot;

/// Host-provided reply sink for one request.
pub trait MethodResult {
    fn success(self, value: Value);
    fn error(self, code: &str, message: &str, details: Option<Value>);
    fn not_implemented(self);
}

pub struct ResponseChannel<'a> {
    name: String,
    dispatcher: &'a QueryDispatcher,
    ctx: &'a AppContext,
}

impl<'a> ResponseChannel<'a> {
    pub fn new(name: impl Into<String>, dispatcher: &'a QueryDispatcher, ctx: &'a AppContext) -> Self {
        Self {
            name: name.into(),
            dispatcher,
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decode a raw JSON request and answer it.
    pub fn handle<R: MethodResult>(&self, raw: &str, result: R) {
        match serde_json::from_str::<RequestEnvelope>(raw) {
            Ok(req) => self.handle_envelope(&req, result),
            Err(e) => {
                tracing::warn!(channel = %self.name, error = %e, "malformed request");
                deliver(
                    ResponseEnvelope::error(
                        ErrorCode::InvalidRequest,
                        format!("invalid request: {}", e),
                    ),
                    result,
                );
            }
        }
    }

    pub fn handle_envelope<R: MethodResult>(&self, req: &RequestEnvelope, result: R) {
        let env = self.ctx.environment();
        let response = self.dispatcher.dispatch(req, &env);
        tracing::info!(
            channel = %self.name,
            method = %req.method,
            outcome = %response.kind(),
            "handled request"
        );
        deliver(response, result);
    }
}

fn deliver<R: MethodResult>(response: ResponseEnvelope, result: R) {
    match response {
        ResponseEnvelope::Ok { value } => result.success(value),
        ResponseEnvelope::Error {
            code,
            message,
            details,
        } => {
            let details = if details.is_null() { None } else { Some(details) };
            result.error(&code.to_string(), &message, details);
        }
        ResponseEnvelope::NotImplemented => result.not_implemented(),
    }
}

// ---------------------------------------------------------------------------
// Oneshot adapter for async hosts
// ---------------------------------------------------------------------------

/// Sink that resolves a oneshot receiver with the envelope.
pub struct OneshotResult {
    tx: oneshot::Sender<ResponseEnvelope>,
}

/// A sink plus the receiver it resolves exactly once.
pub fn reply_pair() -> (OneshotResult, oneshot::Receiver<ResponseEnvelope>) {
    let (tx, rx) = oneshot::channel();
    (OneshotResult { tx }, rx)
}

impl OneshotResult {
    fn send(self, response: ResponseEnvelope) {
        if self.tx.send(response).is_err() {
            tracing::debug!("reply receiver dropped before response");
        }
    }
}

impl MethodResult for OneshotResult {
    fn success(self, value: Value) {
        self.send(ResponseEnvelope::Ok { value });
    }

    fn error(self, code: &str, message: &str, details: Option<Value>) {
        let code = serde_json::from_value(Value::String(code.to_string()))
            .unwrap_or(ErrorCode::InternalError);
        self.send(ResponseEnvelope::Error {
            code,
            message: message.to_string(),
            details: details.unwrap_or(Value::Null),
        });
    }

    fn not_implemented(self) {
        self.send(ResponseEnvelope::NotImplemented);
    }
}
