// ABOUTME: HTTP API for the bananadeck application
// ABOUTME: Serves process, expand and health endpoints over a sequential tiny_http loop

use crate::errors::{DeckError, Result};
use crate::pipeline::Pipeline;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use tiny_http::{Header, Method, Response, Server, StatusCode};

pub const SERVICE_NAME: &str = "bananadeck-api";

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub input_path: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub input_path: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    pub slide_number: u32,
    #[serde(default)]
    pub project: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub success: bool,
    pub message: String,
    pub version_dir: PathBuf,
    pub outline_path: PathBuf,
    pub slide_count: usize,
    pub failed_slides: Vec<u32>,
}

/// Status code and JSON body for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, format!("Failed to encode response: {}", e)),
        }
    }

    fn error(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    fn from_error(context: &str, err: &DeckError) -> Self {
        let status = match err {
            DeckError::ValidationError(_) => 400,
            e if e.is_not_found() => 404,
            _ => 500,
        };
        Self::error(status, format!("{}: {}", context, err))
    }
}

/// Dispatch one request. Requests are handled one at a time, so pipeline
/// runs never overlap.
pub fn route(pipeline: &Pipeline<'_>, method: &Method, url: &str, body: &str) -> ApiResponse {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (Method::Get, "/") => ApiResponse {
            status: 200,
            body: json!({
                "message": "BananaDeck API",
                "version": env!("CARGO_PKG_VERSION"),
            }),
        },
        (Method::Get, "/health") => ApiResponse {
            status: 200,
            body: json!({ "status": "healthy", "service": SERVICE_NAME }),
        },
        (Method::Post, "/process") => handle_process(pipeline, body),
        (Method::Post, "/expand") => handle_expand(pipeline, body),
        _ => ApiResponse::error(404, "Not Found"),
    }
}

fn handle_process(pipeline: &Pipeline<'_>, body: &str) -> ApiResponse {
    let request: ProcessRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(422, format!("Invalid request body: {}", e)),
    };

    info!("Processing request for input: {}", request.input_path);
    match pipeline.process_input(&request.input_path) {
        Ok(report) => ApiResponse::ok(&ProcessResponse {
            success: true,
            message: format!(
                "Input processed successfully: {} slides, {} images failed",
                report.outline.len(),
                report.render.failed.len()
            ),
            input_path: request.input_path,
        }),
        Err(e) => {
            error!("Error processing input {}: {}", request.input_path, e);
            ApiResponse::from_error("Error processing input", &e)
        }
    }
}

fn handle_expand(pipeline: &Pipeline<'_>, body: &str) -> ApiResponse {
    let request: ExpandRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::error(422, format!("Invalid request body: {}", e)),
    };

    info!("Expansion request for slide {}", request.slide_number);
    match pipeline.expand_slide(request.project.as_deref(), request.slide_number) {
        Ok(report) => ApiResponse::ok(&ExpandResponse {
            success: true,
            message: format!(
                "Slide {} expanded into {}",
                request.slide_number,
                report.version.path().display()
            ),
            version_dir: report.version.path().to_path_buf(),
            outline_path: report.outline_path,
            slide_count: report.outline.len(),
            failed_slides: report.failed,
        }),
        Err(e) => {
            error!("Error expanding slide {}: {}", request.slide_number, e);
            ApiResponse::from_error("Error expanding slide", &e)
        }
    }
}

/// Serve the API until the listener shuts down.
pub fn serve(pipeline: &Pipeline<'_>, host: &str, port: u16) -> Result<()> {
    let server = Server::http(format!("{}:{}", host, port))
        .map_err(|e| DeckError::ServerError(format!("Failed to start HTTP server: {}", e)))?;
    info!("HTTP server listening on http://{}:{}", host, port);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            warn!("Failed to read request body: {}", e);
        }

        let response = route(pipeline, request.method(), request.url(), &body);
        let mut http_response = Response::from_string(response.body.to_string())
            .with_status_code(StatusCode(response.status));
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
            http_response = http_response.with_header(header);
        }

        if let Err(e) = request.respond(http_response) {
            error!("Failed to send response: {}", e);
        }
    }

    Ok(())
}
