//! AccuAim REST Client
//!
//! Typed calls for every endpoint the desktop client uses. All failures come
//! back as [`AppError`]; nothing here touches UI state.

use crate::domain::error::{AppError, AppResult};
use crate::domain::models::{
    BlockPlan, DashboardStats, LeaderboardEntry, LeaderboardSort, SessionDetails,
    SessionSummary, User,
};
use crate::domain::progress::{ActiveSession, SessionProgress};
use crate::domain::recorder::ShotSink;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::NetworkFailure(e.to_string())
    }
}

/// Login answers a user, or a message when the account is unknown
#[derive(Deserialize)]
#[serde(untagged)]
enum LoginReply {
    User(User),
    Message { message: String },
}

#[derive(Deserialize)]
struct ServerMessage {
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.http.request(method, url)
    }

    /// Send and turn any non-2xx answer into `NetworkFailure`, preferring the
    /// server's own message.
    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServerMessage>(&body)
            .map(|m| m.message)
            .unwrap_or_else(|_| format!("server answered {}", status));
        warn!("Request failed with {}: {}", status, message);
        Err(AppError::NetworkFailure(message))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::NetworkFailure(format!("unexpected response: {}", e)))
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let reply: LoginReply = self
            .send_json(
                self.request(Method::POST, "/user/login")
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        match reply {
            LoginReply::User(user) => {
                info!("Logged in as user {}", user.id);
                Ok(user)
            }
            LoginReply::Message { message } => Err(AppError::Rejected(message)),
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AppResult<()> {
        self.send(
            self.request(Method::POST, "/user/register")
                .json(&json!({ "name": name, "email": email, "password": password })),
        )
        .await?;
        Ok(())
    }

    /// Create a session and return its id.
    ///
    /// Older servers do not echo the id back; the newest session in the
    /// user's list is taken instead.
    pub async fn create_session(&self, user_id: i64, blocks: &[BlockPlan]) -> AppResult<i64> {
        let reply: Value = self
            .send_json(
                self.request(Method::PUT, &format!("/user/{}/sessions", user_id))
                    .json(&json!({ "blocks": blocks })),
            )
            .await?;

        if let Some(id) = ["session_id", "SessionID", "sessionId"]
            .iter()
            .find_map(|key| reply.get(key).and_then(Value::as_i64))
        {
            return Ok(id);
        }

        debug!("Create reply had no session id, falling back to the session list");
        self.list_sessions(user_id)
            .await?
            .last()
            .map(|s| s.session_id)
            .ok_or_else(|| AppError::NetworkFailure("session was not created".into()))
    }

    /// Create a session and load it back as the active one
    pub async fn start_session(&self, user_id: i64, blocks: &[BlockPlan]) -> AppResult<ActiveSession> {
        let session_id = self.create_session(user_id, blocks).await?;
        let details = self.fetch_session(user_id, session_id).await?;
        // Shots are posted per block id, so every planned block must come back
        if details.blocks.len() < blocks.len() {
            warn!(
                "Session {} came back with {} of {} blocks",
                session_id,
                details.blocks.len(),
                blocks.len()
            );
            return Err(AppError::NetworkFailure(format!(
                "session {} has no block list",
                session_id
            )));
        }
        info!(
            "Session {} started with {} blocks",
            session_id,
            details.blocks.len()
        );
        Ok(ActiveSession {
            user_id,
            progress: SessionProgress::new(session_id, details.blocks),
        })
    }

    pub async fn fetch_session(&self, user_id: i64, session_id: i64) -> AppResult<SessionDetails> {
        self.send_json(self.request(
            Method::GET,
            &format!("/user/{}/sessions/{}", user_id, session_id),
        ))
        .await
    }

    pub async fn record_shot(&self, user_id: i64, session_id: i64, block_id: i64) -> AppResult<()> {
        self.send(
            self.request(
                Method::POST,
                &format!("/user/{}/sessions/{}/active-session", user_id, session_id),
            )
            .json(&json!({ "block_id": block_id })),
        )
        .await?;
        Ok(())
    }

    pub async fn finish_session(&self, user_id: i64, session_id: i64) -> AppResult<()> {
        self.send(self.request(
            Method::PUT,
            &format!("/user/{}/sessions/{}/active-session", user_id, session_id),
        ))
        .await?;
        info!("Session {} finished", session_id);
        Ok(())
    }

    pub async fn list_sessions(&self, user_id: i64) -> AppResult<Vec<SessionSummary>> {
        self.send_json(self.request(Method::GET, &format!("/user/{}/sessions", user_id)))
            .await
    }

    pub async fn dashboard(&self, user_id: i64) -> AppResult<DashboardStats> {
        self.send_json(self.request(Method::GET, &format!("/user/{}/dashboard", user_id)))
            .await
    }

    pub async fn leaderboard(&self, sort: LeaderboardSort) -> AppResult<Vec<LeaderboardEntry>> {
        self.send_json(
            self.request(Method::GET, "/leaderboard")
                .query(&[("sort_by", sort.as_query())]),
        )
        .await
    }

    pub async fn update_profile(&self, user_id: i64, name: &str, email: &str) -> AppResult<User> {
        self.send(
            self.request(Method::PUT, &format!("/user/{}", user_id))
                .json(&json!({ "name": name, "email": email })),
        )
        .await?;
        Ok(User {
            id: user_id,
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub async fn change_password(&self, user_id: i64, current: &str, new: &str) -> AppResult<()> {
        self.send(
            self.request(Method::PUT, &format!("/user/{}/change-password", user_id))
                .json(&json!({ "current_password": current, "new_password": new })),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_account(&self, user_id: i64, password: &str) -> AppResult<()> {
        self.send(
            self.request(Method::DELETE, &format!("/user/{}", user_id))
                .json(&json!({ "password": password })),
        )
        .await?;
        info!("Account {} deleted", user_id);
        Ok(())
    }
}

#[async_trait]
impl ShotSink for ApiClient {
    async fn record_made_shot(&self, user_id: i64, session_id: i64, block_id: i64) -> AppResult<()> {
        self.record_shot(user_id, session_id, block_id).await
    }
}
