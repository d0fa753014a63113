//! HttpTaskService — REST client for the remote execution platform

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::RemoteConfig;
use super::client::TaskService;
use super::models::{decode_result, ResultEntry, TaskHandle, TaskSpec, TaskStatus};
use super::{RemoteError, RemoteResult};

/// REST client for the remote task platform.
///
/// `authenticate` exchanges the configured credentials for a bearer token
/// that is attached to every later request.
pub struct HttpTaskService {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

impl HttpTaskService {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn bearer(&self) -> RemoteResult<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| format!("Bearer {}", t))
            .ok_or(RemoteError::NotAuthenticated)
    }

    async fn get(&self, path: &str) -> RemoteResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await?;
        check_status(resp).await
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn authenticate(&self) -> RemoteResult<()> {
        #[derive(Serialize)]
        struct Request<'a> {
            username: &'a str,
            password: &'a str,
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let url = format!("{}/token/user", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&Request {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;

        let resp = match check_status(resp).await {
            Ok(resp) => resp,
            Err(RemoteError::Api { status, message }) if status == 401 || status == 400 => {
                return Err(RemoteError::AuthFailed(message));
            }
            Err(e) => return Err(e),
        };

        let body: TokenResponse = resp.json().await?;
        *self.token.write().await = Some(body.access_token);
        info!(user = %self.username, server = %self.base_url, "Authenticated with remote service");
        Ok(())
    }

    async fn submit(&self, spec: &TaskSpec) -> RemoteResult<TaskHandle> {
        #[derive(Deserialize)]
        struct CreatedTask {
            id: u64,
        }

        let url = format!("{}/task", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.bearer().await?)
            .json(&spec.request_body())
            .send()
            .await?;

        let body: CreatedTask = check_status(resp).await?.json().await?;
        Ok(TaskHandle { id: body.id })
    }

    async fn status(&self, handle: &TaskHandle) -> RemoteResult<TaskStatus> {
        let resp = self.get(&format!("/task/{}", handle.id)).await?;
        Ok(resp.json().await?)
    }

    async fn fetch_result(&self, handle: &TaskHandle) -> RemoteResult<Vec<ResultEntry>> {
        #[derive(Deserialize)]
        struct RawEntry {
            #[serde(default)]
            id: Option<u64>,
            #[serde(default)]
            result: serde_json::Value,
            #[serde(default)]
            finished_at: Option<String>,
        }

        #[derive(Deserialize)]
        struct ResultPage {
            data: Vec<RawEntry>,
        }

        let resp = self.get(&format!("/result?task_id={}", handle.id)).await?;
        let body: ResultPage = resp.json().await?;

        body.data
            .into_iter()
            .map(|raw| -> RemoteResult<ResultEntry> {
                Ok(ResultEntry {
                    id: raw.id,
                    result: decode_result(raw.result)?,
                    finished_at: raw.finished_at,
                })
            })
            .collect()
    }
}

/// Turn a non-success response into `RemoteError::Api`, pulling the
/// platform's `msg` (or `error`) field when the body is JSON.
async fn check_status(resp: Response) -> RemoteResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| {
            v.get("msg")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });

    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}
