//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime;

use super::reload;

/// Respond with a static file, injecting the reload client into HTML.
pub fn respond_file(request: Request, path: &Path, ws_port: Option<u16>) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type, ws_port);
    send_body(request, 200, content_type, body)
}

/// Respond with the built 404 page when the site ships one.
pub fn respond_not_found(request: Request, dist: &Path, ws_port: Option<u16>) -> Result<()> {
    use mime::types::{HTML, PLAIN};

    let custom = dist.join("404.html");
    let has_custom = custom.is_file();

    if is_head_request(&request) {
        let content_type = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, content_type);
    }

    if has_custom
        && let Ok(body) = fs::read(&custom)
    {
        let body = maybe_inject_reload(body, HTML, ws_port);
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 405 for anything that is not a read.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", mime::types::PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 while the process is shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(
        request,
        503,
        mime::types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

/// Serve the reload client from memory.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    let body = reload::client_script(ws_port);
    send_body(request, 200, mime::types::JAVASCRIPT, body.into_bytes())
}

/// Inject the reload script tag into HTML bodies while the hub is running.
fn maybe_inject_reload(body: Vec<u8>, content_type: &str, ws_port: Option<u16>) -> Vec<u8> {
    match (content_type.starts_with("text/html"), ws_port) {
        (true, Some(_)) => inject_reload_tag(&body),
        _ => body,
    }
}

/// Splice the script tag in front of `</body>`, or append when absent.
fn inject_reload_tag(content: &[u8]) -> Vec<u8> {
    let tag = format!("<script defer src=\"{}\"></script>", reload::SCRIPT_URL);
    let tag_bytes = tag.as_bytes();

    const PATTERN: &[u8] = b"</body>";

    let insert_at = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + tag_bytes.len());
    result.extend_from_slice(&content[..insert_at]);
    result.extend_from_slice(tag_bytes);
    result.extend_from_slice(&content[insert_at..]);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
