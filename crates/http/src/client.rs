//! API client that runs every call through both interceptor stages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gatehouse_auth::{ActionError, UserInfo, UserInfoProvider};
use gatehouse_core::{GatehouseConfig, SessionContext};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ApiError, RawResponse, RequestInterceptor, ResponseInterceptor, TransportError};

pub struct ApiClient {
    http: Client,
    base_url: String,
    requests: RequestInterceptor,
    responses: ResponseInterceptor,
}

impl ApiClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        session: Arc<SessionContext>,
        responses: ResponseInterceptor,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            requests: RequestInterceptor::new(session),
            responses,
        }
    }

    /// Client for `config.api_base_url` with the configured request timeout.
    pub fn from_config(
        config: &GatehouseConfig,
        session: Arc<SessionContext>,
        responses: ResponseInterceptor,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ApiError::Build)?;
        Ok(Self::new(http, &config.api_base_url, session, responses))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Send a request and return the envelope payload.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Value, ApiError> {
        let request = self.requests.intercept(builder.build())?;
        let method = request.method().clone();
        let url = request.url().path().to_string();
        tracing::debug!(%method, %url, "api request");

        let outcome = match self.http.execute(request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(body) => Ok(RawResponse::new(status, body.to_vec())),
                    Err(err) => Err(TransportError::from(err)),
                }
            }
            Err(err) => Err(TransportError::from(err)),
        };

        self.responses.intercept(outcome).await
    }

    /// Send a request and decode the payload into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let payload = self.send(builder).await?;
        serde_json::from_value(payload).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

/// Fetches the current user from the API.
///
/// The token argument is not forwarded explicitly: the request stage reads it
/// from the shared session like any other call.
pub struct HttpUserInfoProvider {
    client: Arc<ApiClient>,
    path: String,
}

impl HttpUserInfoProvider {
    pub fn new(client: Arc<ApiClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

#[async_trait]
impl UserInfoProvider for HttpUserInfoProvider {
    async fn current_user(&self, _token: &str) -> Result<UserInfo, ActionError> {
        self.client
            .send_json::<UserInfo>(self.client.get(&self.path))
            .await
            .map_err(|err| ActionError::UserInfo(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base_url() {
        let session = Arc::new(SessionContext::new());
        let client = ApiClient::new(
            Client::new(),
            "http://api.local/v1/",
            session.clone(),
            ResponseInterceptor::new(session),
        );
        assert_eq!(client.base_url(), "http://api.local/v1");
        assert_eq!(client.url("/user/info"), "http://api.local/v1/user/info");
        assert_eq!(client.url("orders"), "http://api.local/v1/orders");
    }

    #[test]
    fn from_config_uses_configured_base_url() {
        let session = Arc::new(SessionContext::new());
        let config = GatehouseConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..GatehouseConfig::default()
        };
        let client =
            ApiClient::from_config(&config, session.clone(), ResponseInterceptor::new(session))
                .unwrap();
        assert_eq!(client.url("/ping"), "http://127.0.0.1:9/ping");
    }
}
