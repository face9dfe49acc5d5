//! Recording transport double.
//!
//! Implements both adapter traits, records every exchange in order, and
//! replays queued replies. With the queue empty it answers `null`.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::catalog::Method;
use crate::error::Result;
use crate::protocol::ChannelCall;

use super::{Exchange, RequestTransport, SessionChannel};

#[derive(Default)]
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<Exchange>>,
    replies: Mutex<VecDeque<Result<Value>>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub(crate) fn reply(&self, value: Value) {
        self.replies.lock().push_back(Ok(value));
    }

    /// Queues a failure.
    pub(crate) fn fail(&self, error: crate::Error) {
        self.replies.lock().push_back(Err(error));
    }

    pub(crate) fn calls(&self) -> Vec<Exchange> {
        self.calls.lock().clone()
    }

    fn record(&self, exchange: Exchange) -> Result<Value> {
        self.calls.lock().push(exchange);
        self.replies.lock().pop_front().unwrap_or(Ok(Value::Null))
    }
}

#[async_trait]
impl RequestTransport for RecordingTransport {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.record(Exchange::Request {
            method,
            path: path.to_string(),
            body: body.cloned(),
        })
    }
}

#[async_trait]
impl SessionChannel for RecordingTransport {
    async fn call(&self, call: ChannelCall) -> Result<Value> {
        self.record(Exchange::Channel(call))
    }
}
