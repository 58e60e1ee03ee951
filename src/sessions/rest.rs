//! Cookie-authenticated REST session over reqwest

use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value as Json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::session::HttpSession;
use crate::{ProtectError, Result};

const TOKEN_COOKIE: &str = "TOKEN";
const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    csrf: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    remember_me: bool,
}

/// Session that logs in with username and password and keeps the `TOKEN`
/// cookie plus CSRF token for later requests.
#[derive(Debug)]
pub struct ReqwestSession {
    client: Client,
    api_base: String,
    login_url: String,
    username: String,
    password: String,
    credentials: Mutex<Option<Credentials>>,
}

impl ReqwestSession {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if !config.verify_ssl {
            warn!("TLS certificate verification is disabled for REST requests");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ProtectError::connection_failed_with_source("Cannot build HTTP client", e.into()))?;

        Ok(Self {
            client,
            api_base: config.api_base_url(),
            login_url: config.login_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            credentials: Mutex::new(None),
        })
    }

    async fn credentials(&self) -> Result<Credentials> {
        let mut guard = self.credentials.lock().await;
        if let Some(credentials) = guard.as_ref() {
            return Ok(credentials.clone());
        }

        let credentials = self.login().await?;
        *guard = Some(credentials.clone());
        Ok(credentials)
    }

    async fn login(&self) -> Result<Credentials> {
        info!("Logging in as {}", self.username);
        let body = LoginRequest { username: &self.username, password: &self.password, remember_me: false };
        let response = self
            .client
            .post(&self.login_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("auth/login", e))?;

        let response = check_status("auth/login", response).await?;
        let token = token_cookie(response.headers())
            .ok_or_else(|| ProtectError::NotAuthorized { details: "login response carried no TOKEN cookie".into() })?;
        let csrf = header_str(response.headers(), CSRF_HEADER);

        debug!("Login succeeded (csrf token {})", if csrf.is_some() { "present" } else { "absent" });
        Ok(Credentials { token, csrf })
    }

    fn authorize(&self, builder: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
        let builder = builder.header(COOKIE, format!("{}={}", TOKEN_COOKIE, credentials.token));
        match &credentials.csrf {
            Some(csrf) => builder.header(CSRF_HEADER, csrf),
            None => builder,
        }
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Map<String, Json>>) -> Result<Json> {
        let credentials = self.credentials().await?;
        let url = format!("{}{}", self.api_base, path);
        debug!("{} {}", method, path);

        let mut builder = self.authorize(self.client.request(method, &url), &credentials);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| request_error(path, e))?;
        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            // Force a fresh login next time.
            *self.credentials.lock().await = None;
        }
        let response = check_status(path, response).await?;

        // Servers rotate the CSRF token on some responses.
        if let Some(csrf) = header_str(response.headers(), CSRF_HEADER) {
            if let Some(credentials) = self.credentials.lock().await.as_mut() {
                credentials.csrf = Some(csrf);
            }
        }

        let text = response.text().await.map_err(|e| request_error(path, e))?;
        if text.trim().is_empty() {
            return Ok(Json::Null);
        }
        serde_json::from_str(&text).map_err(|e| ProtectError::json(path, e))
    }
}

#[async_trait::async_trait]
impl HttpSession for ReqwestSession {
    async fn auth_headers(&self) -> Result<Vec<(String, String)>> {
        let credentials = self.credentials().await?;
        let mut headers = vec![(COOKIE.as_str().to_string(), format!("{}={}", TOKEN_COOKIE, credentials.token))];
        if let Some(csrf) = credentials.csrf {
            headers.push((CSRF_HEADER.to_string(), csrf));
        }
        Ok(headers)
    }

    async fn get_json(&self, path: &str) -> Result<Json> {
        self.request(Method::GET, path, None).await
    }

    async fn patch_json(&self, path: &str, body: &Map<String, Json>) -> Result<Json> {
        self.request(Method::PATCH, path, Some(body)).await
    }
}

fn request_error(path: &str, e: reqwest::Error) -> ProtectError {
    ProtectError::request_failed(path, e.status().map(|s| s.as_u16()), e.to_string())
}

async fn check_status(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let details = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ProtectError::NotAuthorized { details: format!("{} returned {}", path, status) })
        }
        _ => Err(ProtectError::request_failed(path, Some(status.as_u16()), details)),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Value of the `TOKEN` cookie among the `Set-Cookie` headers.
fn token_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
}
