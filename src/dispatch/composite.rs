//! Built-in multi-step commands.
//!
//! # newWindow
//!
//! | Session | Calls, in order |
//! |---------|-----------------|
//! | mobile | none, fails "not supported on mobile" |
//! | BiDi | `browsingContext.create`, `browsingContext.navigate` |
//! | Classic | `getWindowHandles`, `executeScript`, `getWindowHandles` (repeated until a new handle shows up), `switchToWindow` |
//!
//! Each step starts only after the previous one succeeded. A failed step
//! aborts the sequence and its error is returned as is. The repeated
//! enumeration is bounded by the engine's [`HandlePolling`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::catalog::{Parameter, TypeDescriptor, ValueKind};
use crate::error::{Error, Restriction, Result};
use crate::identifiers::WindowHandle;
use crate::protocol::{BrowsingContextCommand, ContextType};
use crate::session::{ProtocolMode, Session, SessionCapabilities};
use crate::transport::Exchange;

use super::arguments::Arguments;
use super::builder::HandlePolling;
use super::engine::DispatchEngine;
use super::resolver::Composite;
use super::validator::validate_parameters;

// ============================================================================
// Constants
// ============================================================================

/// Opens a window from `[url, windowName, windowFeatures]`.
pub(crate) const OPEN_WINDOW_SCRIPT: &str = "window.open(arguments[0], arguments[1], arguments[2])";

/// `newWindow` parameter schema.
static NEW_WINDOW_PARAMETERS: LazyLock<Vec<Parameter>> = LazyLock::new(|| {
    let string = || TypeDescriptor::of(ValueKind::String);
    vec![
        Parameter::new("url", string(), true),
        Parameter::new("type", string(), false),
        Parameter::new("windowName", string(), false),
        Parameter::new("windowFeatures", string(), false),
    ]
});

// ============================================================================
// WindowPlan
// ============================================================================

/// `newWindow` strategy for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowPlan {
    /// Refuse without touching the transport.
    Reject(Restriction),
    /// Two channel calls.
    Bidi,
    /// Four request/response calls.
    Classic,
}

impl WindowPlan {
    /// Picks the plan from session capabilities.
    pub(crate) fn select(capabilities: SessionCapabilities) -> Self {
        if !capabilities.permits(Restriction::Mobile) {
            return Self::Reject(Restriction::Mobile);
        }
        match capabilities.protocol_mode {
            ProtocolMode::Bidi => Self::Bidi,
            ProtocolMode::Classic => Self::Classic,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Runs a composite command.
pub(crate) async fn run(
    engine: &DispatchEngine,
    composite: Composite,
    session: &Session,
    args: &Arguments,
) -> Result<Value> {
    match composite {
        Composite::NewWindow => new_window(engine, session, args).await,
    }
}

/// Validated `newWindow` arguments.
struct NewWindowRequest {
    url: String,
    context_type: ContextType,
    window_name: String,
    window_features: String,
}

impl NewWindowRequest {
    fn parse(engine: &DispatchEngine, args: &Arguments) -> Result<Self> {
        let name = Composite::NewWindow.name();
        let validated = validate_parameters(
            name,
            &[],
            &NEW_WINDOW_PARAMETERS,
            args,
            engine.extra_arguments(),
        )?;

        let text = |key: &str| {
            validated
                .body
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let context_type = match validated.body.get("type").and_then(Value::as_str) {
            None => ContextType::default(),
            Some(raw) => raw.parse().map_err(|_| {
                Error::validation(
                    name,
                    format!("Invalid window type \"{raw}\"\nExpected: tab or window"),
                )
            })?,
        };

        Ok(Self {
            url: text("url"),
            context_type,
            window_name: text("windowName"),
            window_features: text("windowFeatures"),
        })
    }
}

async fn new_window(engine: &DispatchEngine, session: &Session, args: &Arguments) -> Result<Value> {
    let plan = WindowPlan::select(session.capabilities());
    if let WindowPlan::Reject(restriction) = plan {
        return Err(Error::unsupported(Composite::NewWindow.name(), restriction));
    }

    let request = NewWindowRequest::parse(engine, args)?;
    debug!(
        session = %session.id(),
        ?plan,
        context_type = %request.context_type,
        "Opening new window"
    );

    let handle = match plan {
        WindowPlan::Bidi => open_over_channel(session, &request).await?,
        _ => open_over_requests(engine, session, &request).await?,
    };

    Ok(json!({ "handle": handle, "type": request.context_type }))
}

async fn open_over_channel(session: &Session, request: &NewWindowRequest) -> Result<WindowHandle> {
    let create = BrowsingContextCommand::Create {
        context_type: request.context_type,
    }
    .into_call()?;
    let created = session
        .transport()
        .exchange(Exchange::Channel(create))
        .await?;

    let context = created
        .get("context")
        .and_then(Value::as_str)
        .map(WindowHandle::new)
        .ok_or_else(|| {
            Error::unexpected_response(
                Composite::NewWindow.name(),
                format!("browsingContext.create returned no context: {created}"),
            )
        })?;

    let navigate = BrowsingContextCommand::Navigate {
        context: context.clone(),
        url: request.url.clone(),
    }
    .into_call()?;
    session
        .transport()
        .exchange(Exchange::Channel(navigate))
        .await?;

    Ok(context)
}

async fn open_over_requests(
    engine: &DispatchEngine,
    session: &Session,
    request: &NewWindowRequest,
) -> Result<WindowHandle> {
    let before = window_handles(engine, session).await?;

    engine
        .dispatch_catalog(
            session,
            "executeScript",
            &Arguments::from(json!({
                "script": OPEN_WINDOW_SCRIPT,
                "args": [request.url, request.window_name, request.window_features],
            })),
        )
        .await?;

    let handle = await_new_handle(engine, session, &before).await?;

    engine
        .dispatch_catalog(
            session,
            "switchToWindow",
            &Arguments::named([("handle", handle.as_str())]),
        )
        .await?;

    Ok(handle)
}

/// Enumerates handles until one absent from `before` appears.
async fn await_new_handle(
    engine: &DispatchEngine,
    session: &Session,
    before: &[WindowHandle],
) -> Result<WindowHandle> {
    let HandlePolling { attempts, interval } = engine.handle_polling();

    for attempt in 1..=attempts {
        let after = window_handles(engine, session).await?;
        if let Some(handle) = after.into_iter().find(|handle| !before.contains(handle)) {
            return Ok(handle);
        }
        if attempt < attempts {
            trace!(attempt, "New window handle not listed yet");
            tokio::time::sleep(interval).await;
        }
    }

    Err(Error::unexpected_response(
        Composite::NewWindow.name(),
        format!("no new window handle appeared after window.open ({attempts} enumerations)"),
    ))
}

async fn window_handles(engine: &DispatchEngine, session: &Session) -> Result<Vec<WindowHandle>> {
    let handles = engine
        .dispatch_catalog(session, "getWindowHandles", &Arguments::None)
        .await?;

    Ok(handles
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(WindowHandle::new)
                .collect()
        })
        .unwrap_or_default())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_selection() {
        let desktop = SessionCapabilities::desktop();
        assert_eq!(WindowPlan::select(desktop), WindowPlan::Classic);
        assert_eq!(
            WindowPlan::select(desktop.with_protocol_mode(ProtocolMode::Bidi)),
            WindowPlan::Bidi
        );
        assert_eq!(
            WindowPlan::select(
                desktop
                    .with_protocol_mode(ProtocolMode::Bidi)
                    .with_mobile(true)
            ),
            WindowPlan::Reject(Restriction::Mobile)
        );
    }

    #[test]
    fn test_parameter_schema() {
        let required: Vec<&str> = NEW_WINDOW_PARAMETERS
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(required, ["url"]);
        assert_eq!(NEW_WINDOW_PARAMETERS.len(), 4);
    }
}
