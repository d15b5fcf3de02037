use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::models::{
    AccessToken, Activity, ActivityInput, EditRequest, Health, LoginRequest, Profile, RegisterRequest,
    UserInfo,
};

/// Async client for the Reactivities API.
///
/// Authenticates with a bearer token when one is set. The underlying HTTP
/// client also keeps a cookie jar, so [`ActivitiesClient::login_with_cookie`]
/// works without a token.
#[derive(Debug, Clone)]
pub struct ActivitiesClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ActivitiesClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self::with_http_client(client, base_url))
    }

    /// Use a preconfigured `reqwest::Client` (proxy settings, timeouts, cookie jar).
    pub fn with_http_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await?;
        Err(ClientError::from_body(status.as_u16(), body))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let text = Self::check(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Create an account.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/api/account/register")
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Sign in and keep the returned bearer token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AccessToken, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/api/login")
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let token: AccessToken = Self::json(response).await?;
        self.token = Some(token.access_token.clone());
        Ok(token)
    }

    /// Sign in with a session cookie instead of a token. `persistent`
    /// requests a cookie that outlives the browser session.
    pub async fn login_with_cookie(&self, email: &str, password: &str, persistent: bool) -> Result<(), ClientError> {
        let query = if persistent { "useCookies=true" } else { "useSessionCookies=true" };
        let response = self
            .request(reqwest::Method::POST, &format!("/api/login?{}", query))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// The signed-in user, or `None` when anonymous.
    pub async fn user_info(&self) -> Result<Option<UserInfo>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, "/api/account/user-info")
            .send()
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(Self::json(response).await?))
    }

    /// End the session and forget the token.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/api/account/logout")
            .send()
            .await?;
        Self::check(response).await?;
        self.token = None;
        Ok(())
    }

    pub async fn list_activities(&self) -> Result<Vec<Activity>, ClientError> {
        let response = self.request(reqwest::Method::GET, "/api/activities").send().await?;
        Self::json(response).await
    }

    pub async fn activity(&self, id: &str) -> Result<Activity, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/api/activities/{}", id))
            .send()
            .await?;
        Self::json(response).await
    }

    /// Create an activity hosted by the caller. Returns its id.
    pub async fn create_activity(&self, input: &ActivityInput) -> Result<String, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/api/activities")
            .json(input)
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn edit_activity(&self, id: &str, input: &ActivityInput) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/api/activities/{}", id))
            .json(&EditRequest { id, input })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn delete_activity(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/api/activities/{}", id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Join, leave, or (as host) toggle cancellation.
    pub async fn attend(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/api/activities/{}/attend", id))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn profile(&self, user_id: &str) -> Result<Profile, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/api/profiles/{}", user_id))
            .send()
            .await?;
        Self::json(response).await
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        Self::json(response).await
    }
}
