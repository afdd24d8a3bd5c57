//! HTTP Server for the campaign insights pipeline
//! Simple HTTP server using tokio and basic HTTP handling

use campaign_insights::bootstrap::build_pipeline;
use campaign_insights::config::{init_tracing, AppConfig};
use campaign_insights::InsightPipeline;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

const MAX_REQUEST_BYTES: usize = 1_000_000;

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let config = AppConfig::from_env()?;
    let pipeline = Arc::new(build_pipeline(&config).await?);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "server listening");

    loop {
        let (stream, addr) = listener.accept().await?;
        debug!(%addr, "new connection");
        tokio::spawn(handle_connection(stream, Arc::clone(&pipeline)));
    }
}

async fn handle_connection(mut stream: TcpStream, pipeline: Arc<InsightPipeline>) {
    // Read request with timeout to prevent hanging
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n").map(|i| i + 4) {
                            match extract_content_length(s) {
                                Some(content_length) if buffer.len() >= headers_end + content_length => break,
                                None if n < temp_buf.len() => break,
                                _ => {}
                            }
                        }
                    }
                    if buffer.len() > MAX_REQUEST_BYTES {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to read from stream");
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if !matches!(read_result, Ok(Ok(()))) {
        warn!("request read failed or timed out");
        return;
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request, &pipeline).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                warn!(error = %e, "failed to write response");
            }
        }
        Err(e) => {
            warn!(error = %e, "request is not valid UTF-8");
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

fn extract_body(request: &str) -> &str {
    request
        .find("\r\n\r\n")
        .map(|idx| request[idx + 4..].trim())
        .unwrap_or("")
}

async fn handle_request(request: &str, pipeline: &InsightPipeline) -> String {
    let request_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() < 2 {
        return create_response(400, "Bad Request", r#"{"error":"Malformed request line"}"#);
    }

    let method = parts[0];
    let raw_path = parts[1].split('?').next().unwrap_or("/");
    let path = match raw_path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };

    debug!(%method, %path, "request");

    match (method, path) {
        ("OPTIONS", _) => create_response(204, "No Content", ""),
        ("GET", "/") | ("GET", "/api/health") => {
            create_response(200, "OK", r#"{"status":"ok"}"#)
        }
        ("POST", "/ask") => match serde_json::from_str::<AskRequest>(extract_body(request)) {
            Ok(req) => run_pipeline(pipeline, &req.question).await,
            Err(e) => bad_request(&e.to_string()),
        },
        ("POST", "/api/query") => match serde_json::from_str::<QueryRequest>(extract_body(request)) {
            Ok(req) => run_pipeline(pipeline, &req.query).await,
            Err(e) => bad_request(&e.to_string()),
        },
        _ => create_response(404, "Not Found", r#"{"error":"Not found"}"#),
    }
}

async fn run_pipeline(pipeline: &InsightPipeline, question: &str) -> String {
    match pipeline.answer(question).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(body) => create_response(200, "OK", &body),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                create_response(500, "Internal Server Error", r#"{"error":"Failed to serialize response"}"#)
            }
        },
        Err(e) => {
            error!(error = %e, "pipeline failed");
            let body = serde_json::json!({ "error": e.to_string() });
            create_response(502, "Bad Gateway", &body.to_string())
        }
    }
}

fn bad_request(message: &str) -> String {
    let body = serde_json::json!({ "error": format!("Invalid JSON body: {}", message) });
    create_response(400, "Bad Request", &body.to_string())
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
