//! The single configured request pipeline to the quiz backend.
//!
//! Outbound, every request carries the stored bearer token when there is one.
//! Inbound, failures are normalized into [`ClientError`]:
//!
//! 1. no response (timeout, refused connection) becomes `NetworkUnavailable`
//!    and leaves the session alone;
//! 2. a 401 clears the session and sends the application to the login route
//!    with `reason=session_expired`;
//! 3. any other error status becomes `ServerError` carrying the backend's
//!    message when it sent one.

use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::ClientConfig,
    errors::{ClientError, ClientResult},
    services::navigation::{session_expired_path, Navigator},
    session::SessionContext,
};

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    login_route: String,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            login_route: config.login_route.clone(),
            session,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Starts a request to `path`, attaching the stored token if present.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method.clone(), self.url(path));
        match self.session.token() {
            Some(token) => {
                log::debug!("API request {} {}", method, path);
                builder.bearer_auth(token)
            }
            None => {
                log::warn!("No token found for request to {}", path);
                builder
            }
        }
    }

    /// Starts a request to `path` without any credentials.
    pub(crate) fn bare_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    /// Sends `request` through the full inbound interception.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        match self.send(request).await {
            Err(ClientError::ServerError { status: 401, message }) => {
                self.expire_session();
                Err(ClientError::Unauthorized(message))
            }
            other => other,
        }
    }

    /// Sends `request` without the 401 redirect. Used by the auth endpoints,
    /// where a 401 means rejected credentials rather than an expired session.
    pub(crate) async fn execute_unguarded<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        self.send(request).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::GET, path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.execute(self.request(Method::DELETE, path)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await.map_err(|e| {
            log::error!("API request failed without a response: {}", e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ClientError::from_response(status, &body);
            if status == StatusCode::UNAUTHORIZED {
                log::warn!("API responded 401 Unauthorized: {}", err);
            } else {
                log::error!("API error: {}", err);
            }
            return Err(err);
        }

        decode_body(&body)
    }

    fn expire_session(&self) {
        log::warn!("Session rejected by the server, logging out");
        self.session.clear();
        self.navigator.navigate(&session_expired_path(&self.login_route));
    }
}

/// An empty body decodes as JSON `null`, so `()` and `Option<_>` responses work.
fn decode_body<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    let body = if body.trim().is_empty() { "null" } else { body };
    Ok(serde_json::from_str(body)?)
}
