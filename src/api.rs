//! Client for the remote admin API.
//!
//! One attempt per call; the caller decides whether to try again.

use crate::models::{
    LoginRequest, LoginResponse, RevenueSummary, TokenRequest, UserDetail, UserDetailRequest,
    UserSummary, UsersResponse,
};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};

pub const LOGIN_PATH: &str = "/api/users/admin/login";
pub const REVENUE_SUMMARY_PATH: &str = "/api/data/admin/revenue-summary";
pub const USERS_PATH: &str = "/api/data/admin/getusers";
pub const USER_DETAILS_PATH: &str = "/api/data/admin/user-details";

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self
            .post(LOGIN_PATH, &LoginRequest { email, password })
            .await?;
        if response.token.is_empty() {
            return Err(ApiError::MissingField("token"));
        }
        Ok(response)
    }

    pub async fn revenue_summary(&self, token: &str) -> Result<RevenueSummary, ApiError> {
        self.post(REVENUE_SUMMARY_PATH, &TokenRequest { admin_token: token })
            .await
    }

    pub async fn users(&self, token: &str) -> Result<Vec<UserSummary>, ApiError> {
        let response: UsersResponse = self
            .post(USERS_PATH, &TokenRequest { admin_token: token })
            .await?;
        Ok(response.users)
    }

    pub async fn user_detail(&self, token: &str, user_id: &str) -> Result<UserDetail, ApiError> {
        self.post(
            USER_DETAILS_PATH,
            &UserDetailRequest {
                admin_token: token,
                user_id,
            },
        )
        .await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.post(&url).json(body).send().await?;

        if resp.status().is_success() {
            resp.json().await.map_err(ApiError::Decode)
        } else {
            Err(ApiError::Http(resp.status()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(StatusCode),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(reqwest::Error),

    #[error("Response is missing `{0}`")]
    MissingField(&'static str),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http(status) if *status == StatusCode::UNAUTHORIZED)
    }
}
