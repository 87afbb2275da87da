use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::credentials::Credentials;

/// Largest page the identity service returns from a user listing.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Missing API key")]
    MissingApiKey,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("No user with email {0}")]
    UserNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    #[serde(rename = "localId")]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserPage {
    pub users: Vec<IdentityUser>,
    pub next_page_token: Option<String>,
}

#[derive(Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(rename = "disableUser", skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("disabled", &self.disabled)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// The authentication service as the scripts see it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError>;

    async fn list_users(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<UserPage, IdentityError>;

    async fn update_user(&self, uid: &str, update: &UserUpdate) -> Result<IdentityUser, IdentityError>;

    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError>;

    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError>;
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    email: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<IdentityUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    users: Vec<IdentityUser>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    local_id: &'a str,
    #[serde(flatten)]
    update: &'a UserUpdate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    email: &'a str,
    return_oob_link: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobResponse {
    oob_link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTokenRequest<'a> {
    local_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CustomTokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
    project_id: String,
}

impl IdentityClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(IdentityError::MissingApiKey);
        }

        Ok(Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            project_id: project_id.into(),
        })
    }

    pub fn from_credentials(credentials: &Credentials) -> Result<Self, IdentityError> {
        let identity = credentials
            .identity
            .as_ref()
            .ok_or(IdentityError::MissingApiKey)?;
        Self::new(
            identity.base_url.clone(),
            identity.api_key.clone(),
            credentials.project_id.clone(),
        )
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/projects/{}/accounts:{}",
            self.base_url, self.project_id, method
        )
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(method))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        Self::read(response).await
    }

    async fn read<R: DeserializeOwned>(response: Response) -> Result<R, IdentityError> {
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                return Err(IdentityError::ApiError(error_response.error.message));
            }
            return Err(IdentityError::ApiError(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn get_user_by_email(&self, email: &str) -> Result<IdentityUser, IdentityError> {
        let result: Result<LookupResponse, _> =
            self.post("lookup", &LookupRequest { email: [email] }).await;

        match result {
            Ok(found) => found
                .users
                .into_iter()
                .next()
                .ok_or_else(|| IdentityError::UserNotFound(email.to_string())),
            Err(IdentityError::ApiError(message)) if message.contains("NOT_FOUND") => {
                Err(IdentityError::UserNotFound(email.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn list_users(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<UserPage, IdentityError> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let mut request = self
            .client
            .get(self.endpoint("batchGet"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(&[("maxResults", page_size.to_string())]);
        if let Some(token) = page_token {
            request = request.query(&[("nextPageToken", token)]);
        }

        let page: BatchGetResponse = Self::read(request.send().await?).await?;
        Ok(UserPage {
            users: page.users,
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn update_user(&self, uid: &str, update: &UserUpdate) -> Result<IdentityUser, IdentityError> {
        self.post(
            "update",
            &UpdateRequest {
                local_id: uid,
                update,
            },
        )
        .await
    }

    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        let response: OobResponse = self
            .post(
                "sendOobCode",
                &OobRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                    return_oob_link: true,
                },
            )
            .await?;

        response
            .oob_link
            .ok_or_else(|| IdentityError::InvalidResponse("No oobLink in response".to_string()))
    }

    async fn create_custom_token(&self, uid: &str) -> Result<String, IdentityError> {
        let response: CustomTokenResponse = self
            .post("createCustomToken", &CustomTokenRequest { local_id: uid })
            .await?;

        response
            .token
            .ok_or_else(|| IdentityError::InvalidResponse("No token in response".to_string()))
    }
}
