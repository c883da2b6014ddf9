use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use chat_backend::{
    Conversation, ConversationId, ConversationMessage, HealthResponse, InferenceRequest,
    InferenceResponse, LoginRequest, RegisterRequest, TokenResponse, User,
};

use crate::config::BackendApiConfig;
use crate::error::{parse_error_message, BackendApiError};
use crate::headers::{build_headers, CONTENT_TYPE_JSON};
use crate::url::{api_endpoint, health_endpoint, normalize_base_url};

pub const PATH_REGISTER: &str = "/auth/register";
pub const PATH_LOGIN: &str = "/auth/token";
pub const PATH_ME: &str = "/auth/me";
pub const PATH_CONVERSATIONS: &str = "/conversations";
pub const PATH_CONVERSATION_MESSAGES: &str = "/conversation-messages";
pub const PATH_COMPLETE: &str = "/inference/complete";

#[derive(Debug)]
pub struct BackendApiClient {
    http: Client,
    config: BackendApiConfig,
    base_url: String,
}

impl BackendApiClient {
    pub fn new(config: BackendApiConfig) -> Result<Self, BackendApiError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(BackendApiError::from)?;
        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &BackendApiConfig {
        &self.config
    }

    /// Normalized server root every endpoint is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, BackendApiError> {
        api_endpoint(&self.base_url, path)
    }

    pub fn build_headers(&self, token: Option<&str>) -> Result<HeaderMap, BackendApiError> {
        let headers = build_headers(&self.config, token)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| BackendApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    BackendApiError::InvalidHeader(format!("invalid value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<RequestBuilder, BackendApiError> {
        let headers = self.build_headers(token)?;
        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }
        Ok(request)
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<TokenResponse, BackendApiError> {
        let url = self.endpoint(PATH_REGISTER)?;
        let builder = self.build_request(Method::POST, url, None, Some(request))?;
        debug!(username = %request.username, "backend register");
        self.send_record(builder, PATH_REGISTER).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, BackendApiError> {
        let url = self.endpoint(PATH_LOGIN)?;
        let builder = self.build_request(Method::POST, url, None, Some(request))?;
        debug!(username = %request.username, "backend login");
        self.send_record(builder, PATH_LOGIN).await
    }

    pub async fn me(&self, token: &str) -> Result<User, BackendApiError> {
        let url = self.endpoint(PATH_ME)?;
        let builder = self.build_request::<()>(Method::GET, url, Some(token), None)?;
        self.send_record(builder, PATH_ME).await
    }

    pub async fn list_conversations(
        &self,
        token: &str,
    ) -> Result<Vec<Conversation>, BackendApiError> {
        let url = self.endpoint(PATH_CONVERSATIONS)?;
        let builder = self.build_request::<()>(Method::GET, url, Some(token), None)?;
        let conversations: Option<Vec<Conversation>> = self.send_json(builder).await?;
        Ok(conversations.unwrap_or_default())
    }

    pub async fn list_conversation_messages(
        &self,
        token: &str,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationMessage>, BackendApiError> {
        let mut url = self.endpoint(PATH_CONVERSATION_MESSAGES)?;
        url.query_pairs_mut()
            .append_pair("conversation_id", &conversation_id.to_string());
        let builder = self.build_request::<()>(Method::GET, url, Some(token), None)?;
        let messages: Option<Vec<ConversationMessage>> = self.send_json(builder).await?;
        Ok(messages.unwrap_or_default())
    }

    /// Issues a non-streaming completion. `stream` is forced to `false`.
    pub async fn complete(
        &self,
        token: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, BackendApiError> {
        let mut payload = request.clone();
        payload.stream = false;
        let url = self.endpoint(PATH_COMPLETE)?;
        let builder = self.build_request(Method::POST, url, Some(token), Some(&payload))?;
        debug!(
            conversation_id = ?payload.conversation_id,
            prompt_chars = payload.prompt.chars().count(),
            "backend complete"
        );
        self.send_record(builder, PATH_COMPLETE).await
    }

    /// Probes `GET /health`. A degraded server answers 503 with the same
    /// report shape, which is decoded rather than treated as a failure.
    pub async fn health(&self) -> Result<HealthResponse, BackendApiError> {
        let url = health_endpoint(&self.base_url)?;
        let builder = self.build_request::<()>(Method::GET, url, None, None)?;
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = decode_body::<HealthResponse>(response).await?;
            if let Some(report) = body {
                return Ok(report);
            }
            if status.is_success() {
                return Err(BackendApiError::EmptyPayload { endpoint: "/health" });
            }
            return Err(BackendApiError::Status(
                status,
                parse_error_message(status, ""),
            ));
        }
        Err(status_error(response).await)
    }

    async fn send_record<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<T, BackendApiError> {
        self.send_json(builder)
            .await?
            .ok_or(BackendApiError::EmptyPayload { endpoint })
    }

    /// Sends once and decodes the JSON body. Success responses without a JSON
    /// body decode as `None`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>, BackendApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error = status_error(response).await;
            debug!(status = status.as_u16(), error = %error, "backend request failed");
            return Err(error);
        }
        decode_body(response).await
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains(CONTENT_TYPE_JSON))
}

async fn decode_body<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, BackendApiError> {
    if !is_json(&response) {
        return Ok(None);
    }
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

async fn status_error(response: Response) -> BackendApiError {
    let status = response.status();
    let body = if is_json(&response) {
        response.text().await.unwrap_or_default()
    } else {
        String::new()
    };
    BackendApiError::Status(status, parse_error_message(status, &body))
}
