//! HTTP session trait
//!
//! The session owns authentication and the REST calls the client needs: the
//! bootstrap fetch and record PATCHes. Failures are surfaced to the caller and
//! never retried here.

use serde_json::{Map, Value as Json};

use crate::Result;

#[async_trait::async_trait]
pub trait HttpSession: Send + Sync + 'static {
    /// Headers that authenticate the websocket handshake, logging in if needed.
    async fn auth_headers(&self) -> Result<Vec<(String, String)>>;

    /// GET a JSON document at `path`, relative to the API base.
    async fn get_json(&self, path: &str) -> Result<Json>;

    /// PATCH `body` to `path`, relative to the API base.
    async fn patch_json(&self, path: &str, body: &Map<String, Json>) -> Result<Json>;

    /// Fetch the bootstrap document.
    async fn bootstrap(&self) -> Result<Map<String, Json>> {
        match self.get_json("bootstrap").await? {
            Json::Object(map) => Ok(map),
            other => Err(crate::ProtectError::request_failed(
                "bootstrap",
                None,
                format!("expected a JSON object, got {}", json_type(&other)),
            )),
        }
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
