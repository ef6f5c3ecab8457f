//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio — reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout. Logging goes to stderr.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`) are
//! acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use crate::queries::NetworkQueries;
use crate::tools;

const SERVER_NAME: &str = "mcp-catalyst";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio(queries: NetworkQueries) {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve(reader, writer, &queries).await;
}

/// Serve line-delimited JSON-RPC from `reader` to `writer` until EOF.
pub async fn serve<R, W>(mut reader: R, mut writer: W, queries: &NetworkQueries)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "stdin read error");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                let response = json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": -32700,
                        "message": format!("Parse error: {}", e)
                    }
                });
                write_response(&mut writer, &response).await;
                continue;
            }
        };

        if let Some(response) = handle_request(&request, queries).await {
            write_response(&mut writer, &response).await;
        }
    }
}

/// Handle one decoded request. Returns `None` for notifications.
async fn handle_request(request: &Value, queries: &NetworkQueries) -> Option<Value> {
    let id = request.get("id").cloned();
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    // Notifications (no id) — acknowledge silently
    let Some(id) = id else {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            _ => debug!(method, "unknown notification"),
        }
        return None;
    };

    let mut response = match method {
        "initialize" => handle_initialize(),
        "tools/list" => json!({
            "jsonrpc": "2.0",
            "result": { "tools": tools::tool_definitions() }
        }),
        "tools/call" => handle_tools_call(request, queries).await,
        "ping" => json!({ "jsonrpc": "2.0", "result": {} }),
        _ => json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32601,
                "message": format!("Method not found: {}", method)
            }
        }),
    };
    response["id"] = id;
    Some(response)
}

/// Handle `initialize` — return protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            }
        }
    })
}

/// Handle `tools/call` — dispatch to the appropriate tool handler.
async fn handle_tools_call(request: &Value, queries: &NetworkQueries) -> Value {
    let params = request.get("params").cloned().unwrap_or(json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    debug!(tool = name, "tools/call");
    let result = tools::handle_tool_call(name, &args, queries).await;

    let mut response_result = json!({
        "content": result.content
    });
    if result.is_error {
        response_result["isError"] = json!(true);
    }

    json!({
        "jsonrpc": "2.0",
        "result": response_result
    })
}

/// Write a JSON-RPC response (one line, flushed immediately).
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = writer.write_all(output.as_bytes()).await {
        warn!(error = %e, "stdout write error");
    }
    if let Err(e) = writer.flush().await {
        warn!(error = %e, "stdout flush error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_controller;

    async fn exchange(input: &str) -> Vec<Value> {
        let (_server, client) = mock_controller().await;
        let queries = NetworkQueries::new(client);
        let mut out: Vec<u8> = Vec::new();
        serve(input.as_bytes(), &mut out, &queries).await;
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn initialize_handshake() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}
{"jsonrpc":"2.0","method":"notifications/initialized"}
"#,
        )
        .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], 1);
        assert_eq!(out[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(out[0]["result"]["serverInfo"]["name"], "mcp-catalyst");
    }

    #[tokio::test]
    async fn tools_list_and_ping() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}
{"jsonrpc":"2.0","id":"b","method":"ping"}
"#,
        )
        .await;
        assert_eq!(out[0]["id"], "a");
        assert_eq!(out[0]["result"]["tools"].as_array().unwrap().len(), 5);
        assert_eq!(out[1], json!({"jsonrpc": "2.0", "id": "b", "result": {}}));
    }

    #[tokio::test]
    async fn parse_error_and_unknown_method() {
        let out = exchange("{not json}\n\n{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"resources/list\"}\n").await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["error"]["code"], -32700);
        assert!(out[0]["id"].is_null());
        assert_eq!(out[1]["id"], 7);
        assert_eq!(out[1]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn unknown_tool_sets_is_error() {
        let out = exchange(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope","arguments":{}}}
"#,
        )
        .await;
        assert_eq!(out[0]["result"]["isError"], true);
        assert_eq!(out[0]["result"]["content"][0]["text"], "Unknown tool: nope");
    }
}
