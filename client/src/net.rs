use serde::de::DeserializeOwned;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlCanvasElement, Request, RequestInit, RequestMode, Response, UrlSearchParams, Window,
};

use tracedrive_shared::{MessageResponse, PathRequest, DETECTION_START_ENDPOINT, PATH_ENDPOINT};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unreadable response: {0}")]
    InvalidResponse(String),
    #[error("could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

fn js_error_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{value:?}")
}

fn network(value: JsValue) -> TransportError {
    TransportError::Network(js_error_text(&value))
}

fn invalid(value: JsValue) -> TransportError {
    TransportError::InvalidResponse(js_error_text(&value))
}

/// Server to post to: `?server=` in the page URL, then the canvas `data-server`
/// attribute, then the page's own origin.
pub fn server_base(window: &Window, canvas: &HtmlCanvasElement) -> Result<String, JsValue> {
    let location = window.location();
    let search = location.search()?;
    let from_query = UrlSearchParams::new_with_str(&search)?.get("server");
    let configured = from_query.or_else(|| canvas.get_attribute("data-server"));
    match configured {
        Some(server) if !server.trim().is_empty() => Ok(server.trim().to_string()),
        _ => location.origin(),
    }
}

pub fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!("{}{endpoint}", base.trim_end_matches('/'))
}

async fn post_json<T: DeserializeOwned>(
    window: &Window,
    url: &str,
    body: Option<String>,
) -> Result<T, TransportError> {
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_mode(RequestMode::Cors);
    if let Some(body) = &body {
        init.set_body(&JsValue::from_str(body));
    }
    let request = Request::new_with_str_and_init(url, &init).map_err(network)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(network)?;

    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network)?;
    let response: Response = response.dyn_into().map_err(invalid)?;
    let text = JsFuture::from(response.text().map_err(invalid)?)
        .await
        .map_err(invalid)?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&text).map_err(|error| TransportError::InvalidResponse(error.to_string()))
}

pub async fn send_path(
    window: &Window,
    server: &str,
    request: &PathRequest,
) -> Result<MessageResponse, TransportError> {
    let body = serde_json::to_string(request)?;
    post_json(window, &endpoint_url(server, PATH_ENDPOINT), Some(body)).await
}

/// The reply body is only logged, so any JSON is accepted.
pub async fn start_detection(
    window: &Window,
    server: &str,
) -> Result<serde_json::Value, TransportError> {
    post_json(window, &endpoint_url(server, DETECTION_START_ENDPOINT), None).await
}
