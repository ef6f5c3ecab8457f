//! MCP tool definitions and handlers.
//!
//! Each tool is defined as a JSON schema (returned by [`tool_definitions`])
//! and handled by an async function dispatched from [`handle_tool_call`].
//!
//! - `inventory` — device inventory
//! - `compliance_summary` — compliance status, optionally for one hostname
//! - `client_health` — overall client health
//! - `sda_fabrics` — SDA fabric sites
//! - `config_drift` — current config vs. the snapshot `hours_back` ago
//!
//! Query failures never surface as MCP errors: they come back as a normal
//! result holding `{"message": "..."}`. Only malformed calls (unknown tool,
//! bad argument types) are reported with `isError`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::queries::{NetworkQueries, QueryError};

/// Default look-back window for `config_drift`.
const DEFAULT_HOURS_BACK: u32 = 24;

/// Returns all tool definitions.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "inventory",
            "description": "Return the Catalyst Center device inventory: hostname, management IP, family, platform, software version, serial number, uptime and last update. All values are strings or null.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "compliance_summary",
            "description": "Return configuration compliance status per device. With a hostname, returns only that device's entry, or a message if the controller has no compliance data for it.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "hostname": {
                        "type": "string",
                        "description": "Device hostname. Omit to list every device."
                    }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": "client_health",
            "description": "Return overall client health (score, category, total/healthy/unhealthy counts). Falls back to the previous 5-minute sample if the live query is empty.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "sda_fabrics",
            "description": "List SDA fabric sites (id and site hierarchy name).",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }
        }),
        json!({
            "name": "config_drift",
            "description": "Diff a device's current configuration against its archived snapshot from hours_back hours ago. Returns added/removed line counts and the first 20 lines of a zero-context unified diff, or a message if the device or snapshot does not exist.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "hostname": {
                        "type": "string",
                        "description": "Device hostname as shown in the inventory."
                    },
                    "hours_back": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "How many hours back to take the historical snapshot. Default 24."
                    }
                },
                "required": ["hostname"],
                "additionalProperties": false
            }
        }),
    ]
}

/// Dispatch a `tools/call` to the matching handler.
pub async fn handle_tool_call(name: &str, args: &Value, queries: &NetworkQueries) -> ToolResult {
    match name {
        "inventory" => ToolResult::from_query(name, queries.inventory().await),
        "compliance_summary" => handle_compliance_summary(args, queries).await,
        "client_health" => ToolResult::from_query(name, queries.client_health(now_ms()).await),
        "sda_fabrics" => ToolResult::from_query(name, queries.sda_fabrics().await),
        "config_drift" => handle_config_drift(args, queries).await,
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

/// Result of a tool call, ready to be wrapped in a JSON-RPC response.
#[derive(Debug)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Whether the tool call failed (maps to `isError` in the MCP response).
    pub is_error: bool,
}

impl ToolResult {
    fn success(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }

    /// Records on success, `{"message": ...}` on any query error.
    fn from_query<T: Serialize>(tool: &str, result: Result<T, QueryError>) -> Self {
        match result {
            Ok(records) => match serde_json::to_value(records) {
                Ok(v) => Self::success(v),
                Err(e) => Self::message(format!("Failed to encode result: {}", e)),
            },
            Err(e) => {
                if e.is_upstream() {
                    warn!(tool, error = %e, "query failed");
                } else {
                    debug!(tool, reason = %e, "query returned no records");
                }
                Self::message(e.to_string())
            }
        }
    }

    fn message(message: String) -> Self {
        Self::success(json!({ "message": message }))
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Optional string argument; present-but-wrong-type is an error.
fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, ToolResult> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ToolResult::error(format!("Parameter '{}' must be a string", key))),
    }
}

async fn handle_compliance_summary(args: &Value, queries: &NetworkQueries) -> ToolResult {
    let hostname = match optional_str(args, "hostname") {
        Ok(h) => h,
        Err(e) => return e,
    };
    ToolResult::from_query(
        "compliance_summary",
        queries.compliance_summary(hostname).await,
    )
}

async fn handle_config_drift(args: &Value, queries: &NetworkQueries) -> ToolResult {
    let hostname = match optional_str(args, "hostname") {
        Ok(Some(h)) => h,
        Ok(None) => return ToolResult::error("Missing required parameter: hostname".into()),
        Err(e) => return e,
    };
    let hours_back = match args.get("hours_back") {
        None | Some(Value::Null) => DEFAULT_HOURS_BACK,
        Some(v) => match v.as_u64().and_then(|h| u32::try_from(h).ok()) {
            Some(h) => h,
            None => {
                return ToolResult::error(
                    "Parameter 'hours_back' must be a non-negative integer".into(),
                )
            }
        },
    };

    ToolResult::from_query(
        "config_drift",
        queries.config_drift(hostname, hours_back, now_ms()).await,
    )
}
