//! End-to-end dispatch against recording transports.
//!
//! Drives the public API only: a catalog loaded from JSON, an engine from the
//! builder, and sessions wired to in-memory transports.

use std::collections::VecDeque;
use std::sync::{Arc, Once};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use webdriver_dispatch::protocol::ChannelCall;
use webdriver_dispatch::{
    Arguments, DispatchEngine, Error, Exchange, ExtraArguments, Method, ProtocolMode, Registry,
    RequestTransport, Restriction, Session, SessionCapabilities, SessionChannel, SessionId,
    TransportHandle,
};

// ============================================================================
// Fixtures
// ============================================================================

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Records exchanges and replays queued replies (`null` when empty).
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Exchange>>,
    replies: Mutex<VecDeque<webdriver_dispatch::Result<Value>>>,
}

impl Recorder {
    fn with_replies(replies: impl IntoIterator<Item = Value>) -> Arc<Self> {
        let recorder = Self::default();
        recorder
            .replies
            .lock()
            .extend(replies.into_iter().map(Ok));
        Arc::new(recorder)
    }

    fn calls(&self) -> Vec<Exchange> {
        self.calls.lock().clone()
    }

    fn next(&self, exchange: Exchange) -> webdriver_dispatch::Result<Value> {
        self.calls.lock().push(exchange);
        self.replies.lock().pop_front().unwrap_or(Ok(Value::Null))
    }
}

#[async_trait]
impl RequestTransport for Recorder {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> webdriver_dispatch::Result<Value> {
        self.next(Exchange::Request {
            method,
            path: path.to_string(),
            body: body.cloned(),
        })
    }
}

#[async_trait]
impl SessionChannel for Recorder {
    async fn call(&self, call: ChannelCall) -> webdriver_dispatch::Result<Value> {
        self.next(Exchange::Channel(call))
    }
}

const CATALOG: &str = r#"{
  "/session/:sessionId/element/:elementId/property/:name": {
    "GET": {
      "command": "getElementProperty",
      "variables": [
        "sessionId",
        { "name": "elementId", "description": "element" },
        { "name": "name", "description": "property name" }
      ],
      "returns": { "type": "*", "name": "value" }
    }
  },
  "/session/:sessionId/print": {
    "POST": {
      "command": "printPage",
      "variables": ["sessionId"],
      "parameters": [
        { "name": "orientation", "type": "string", "required": false },
        { "name": "scale", "type": "number", "required": false },
        { "name": "pageRanges", "type": "(string|number)[]", "required": false }
      ],
      "returns": { "type": "string", "name": "pdf" }
    }
  },
  "/session/:sessionId/window/handles": {
    "GET": {
      "command": "getWindowHandles",
      "variables": ["sessionId"],
      "returns": { "type": "String[]", "name": "handles" }
    }
  },
  "/session/:sessionId/window": {
    "POST": {
      "command": "switchToWindow",
      "variables": ["sessionId"],
      "parameters": [{ "name": "handle", "type": "string", "required": true }]
    }
  },
  "/session/:sessionId/execute/sync": {
    "POST": {
      "command": "executeScript",
      "variables": ["sessionId"],
      "parameters": [
        { "name": "script", "type": "string", "required": true },
        { "name": "args", "type": "array", "required": true }
      ],
      "returns": { "type": "*", "name": "result" }
    }
  }
}"#;

fn engine() -> Result<DispatchEngine> {
    let registry = Arc::new(Registry::from_json_str(CATALOG)?);
    Ok(DispatchEngine::builder(registry)
        .extra_arguments(ExtraArguments::Reject)
        .guard("printPage", Restriction::Mobile)
        .build()?)
}

fn session_id() -> SessionId {
    SessionId::new("it-1").expect("non-empty id")
}

fn request(method: Method, path: &str, body: Option<Value>) -> Exchange {
    Exchange::Request {
        method,
        path: path.to_string(),
        body,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_catalog_with_undeclared_placeholder_fails_to_load() {
    let catalog = r#"{
      "/session/:sessionId/element/:elementId/text": {
        "GET": { "command": "getElementText", "variables": ["sessionId"] }
      }
    }"#;

    let err = Registry::from_json_str(catalog).unwrap_err();
    assert!(matches!(err, Error::Catalog { .. }), "{err}");
    assert!(err.to_string().contains(":elementId"), "{err}");
}

#[test]
fn test_every_loaded_definition_is_bijective() -> Result<()> {
    let registry = Registry::from_json_str(CATALOG)?;
    assert_eq!(registry.len(), 5);

    for definition in registry.iter() {
        let mut variables = definition.variables().to_vec();
        let mut placeholders: Vec<String> = definition
            .path
            .as_str()
            .split('/')
            .filter_map(|s| s.strip_prefix(':'))
            .map(str::to_string)
            .collect();
        variables.sort();
        placeholders.sort();
        assert_eq!(variables, placeholders, "{}", definition.name);
    }
    Ok(())
}

#[tokio::test]
async fn test_positional_variables_and_any_return() -> Result<()> {
    init_tracing();
    let recorder = Recorder::with_replies([json!({ "nested": [1, 2] })]);
    let session = Session::classic(session_id(), recorder.clone());

    let value = engine()?
        .invoke(
            &session,
            "getElementProperty",
            Arguments::positional(["el 9", "dataset"]),
        )
        .await?;

    assert_eq!(value, json!({ "nested": [1, 2] }));
    assert_eq!(
        recorder.calls(),
        [request(
            Method::Get,
            "/session/it-1/element/el%209/property/dataset",
            None
        )]
    );
    Ok(())
}

#[tokio::test]
async fn test_optional_parameters_and_element_arrays() -> Result<()> {
    init_tracing();
    let recorder = Recorder::with_replies([json!("JVBERi0=")]);
    let session = Session::classic(session_id(), recorder.clone());
    let engine = engine()?;

    let pdf = engine
        .invoke(
            &session,
            "printPage",
            Arguments::from(json!({ "scale": 0.5, "pageRanges": [1, "3-4"] })),
        )
        .await?;
    assert_eq!(pdf, json!("JVBERi0="));
    assert_eq!(
        recorder.calls(),
        [request(
            Method::Post,
            "/session/it-1/print",
            Some(json!({ "scale": 0.5, "pageRanges": [1, "3-4"] }))
        )]
    );

    let err = engine
        .invoke(
            &session,
            "printPage",
            Arguments::from(json!({ "pageRanges": [true] })),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert!(err.to_string().contains("(string|number)[]"), "{err}");
    assert_eq!(recorder.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reject_policy_blocks_extras_before_transport() -> Result<()> {
    let recorder = Arc::new(Recorder::default());
    let session = Session::classic(session_id(), recorder.clone());

    let err = engine()?
        .invoke(
            &session,
            "printPage",
            Arguments::from(json!({ "orientation": "landscape", "background": true })),
        )
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert!(err.to_string().contains("background"), "{err}");
    assert!(recorder.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_guard_uses_session_capabilities() -> Result<()> {
    let recorder = Arc::new(Recorder::default());
    let capabilities = SessionCapabilities::from_capabilities(&json!({
        "platformName": "iOS",
        "appium:deviceName": "iPhone 15"
    }));
    let session = Session::new(
        session_id(),
        capabilities,
        TransportHandle::new(recorder.clone()),
    )?;

    let err = engine()?
        .invoke(&session, "printPage", Arguments::None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::UnsupportedOperation {
            restriction: Restriction::Mobile,
            ..
        }
    ));
    assert_eq!(err.to_string(), "printPage is not supported on mobile");
    assert!(recorder.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_new_window_bidi_order() -> Result<()> {
    init_tracing();
    let recorder = Recorder::with_replies([json!({ "context": "C-1" }), json!({})]);
    let capabilities = SessionCapabilities::from_capabilities(&json!({
        "browserName": "firefox",
        "webSocketUrl": "ws://127.0.0.1:9222/session/it-1"
    }));
    assert_eq!(capabilities.protocol_mode, ProtocolMode::Bidi);

    let handle = TransportHandle::new(recorder.clone()).with_channel(recorder.clone());
    let session = Session::new(session_id(), capabilities, handle)?;

    let window = engine()?
        .invoke(
            &session,
            "newWindow",
            Arguments::from(json!({ "url": "https://example.com", "type": "tab" })),
        )
        .await?;

    assert_eq!(window, json!({ "handle": "C-1", "type": "tab" }));
    assert_eq!(
        recorder.calls(),
        [
            Exchange::Channel(ChannelCall::new(
                "browsingContext.create",
                json!({ "type": "tab" })
            )),
            Exchange::Channel(ChannelCall::new(
                "browsingContext.navigate",
                json!({ "context": "C-1", "url": "https://example.com" })
            )),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_new_window_classic_through_custom_catalog() -> Result<()> {
    init_tracing();
    let recorder = Recorder::with_replies([
        json!(["A"]),
        Value::Null,
        json!(["A", "B"]),
        Value::Null,
    ]);
    let session = Session::classic(session_id(), recorder.clone());

    let window = engine()?
        .invoke(
            &session,
            "newWindow",
            Arguments::from(json!({ "url": "https://example.com", "windowName": "popup" })),
        )
        .await?;

    assert_eq!(window, json!({ "handle": "B", "type": "window" }));

    let calls = recorder.calls();
    assert_eq!(calls.len(), 4);
    let Exchange::Request {
        body: Some(body), ..
    } = &calls[1]
    else {
        panic!("expected script request, got {}", calls[1]);
    };
    assert_eq!(body["args"], json!(["https://example.com", "popup", ""]));
    assert_eq!(
        calls[3],
        request(
            Method::Post,
            "/session/it-1/window",
            Some(json!({ "handle": "B" }))
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_engine_is_shareable_across_tasks() -> Result<()> {
    let engine = engine()?;
    let recorder = Arc::new(Recorder::default());
    let session = Session::classic(session_id(), recorder.clone());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            let session = session.clone();
            tokio::spawn(async move {
                engine
                    .invoke(
                        &session,
                        "getElementProperty",
                        Arguments::positional([format!("e{i}"), "id".to_string()]),
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await??;
    }
    assert_eq!(recorder.calls().len(), 8);
    Ok(())
}
