//! Client-side narration acquisition.
//!
//! [`NarrationClient`] talks to the HTTP API. [`ArticleView`] keeps at most one
//! acquisition in flight for the article being displayed: loading another
//! article, or tearing the view down, aborts the outstanding request.

use crate::types::{ErrorBody, NarrationRequest, NarrationResponse, SlugParam};
use crate::{NarrationError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const NARRATION_PATH: &str = "/api/text-to-speech";

#[derive(Clone)]
pub struct NarrationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl NarrationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NarrationError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), NARRATION_PATH),
        })
    }

    pub async fn fetch(&self, request: &NarrationRequest) -> Result<NarrationResponse> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| NarrationError::synthesis(format!("request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<NarrationResponse>()
                .await
                .map_err(|e| NarrationError::synthesis(format!("invalid response body: {e}")));
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        let strip = |prefix: &str| message.strip_prefix(prefix).unwrap_or(&message).to_string();
        Err(match status.as_u16() {
            400 => NarrationError::InvalidSlug(strip("Invalid slug: ")),
            404 => NarrationError::ArticleNotFound(strip("Article not found: ")),
            code => NarrationError::SynthesisFailed {
                status: Some(code),
                detail: message,
            },
        })
    }
}

/// What the article view shows for its narration
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationState {
    Idle,
    Loading { slug: String },
    Ready { slug: String, narration: NarrationResponse },
    Failed { slug: String, error: String },
}

pub struct ArticleView {
    client: NarrationClient,
    state: Arc<watch::Sender<NarrationState>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl ArticleView {
    pub fn new(client: NarrationClient) -> Self {
        let (tx, _) = watch::channel(NarrationState::Idle);
        Self {
            client,
            state: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn state(&self) -> NarrationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NarrationState> {
        self.state.subscribe()
    }

    /// Start acquiring the narration for `slug`, cancelling any previous one.
    pub fn load(&mut self, slug: impl Into<SlugParam>) {
        self.cancel();

        let request = NarrationRequest::for_slug(slug);
        let label = request
            .slug
            .as_ref()
            .map(|s| s.segments().join("/"))
            .unwrap_or_default();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(NarrationState::Loading {
            slug: label.clone(),
        });

        let client = self.client.clone();
        let state = self.state.clone();
        let current = self.generation.clone();
        self.task = Some(tokio::spawn(async move {
            let result = client.fetch(&request).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let mut next = Some(match result {
                Ok(narration) => {
                    debug!(target: "narration", slug = %label, words = narration.timestamps.len(), "Narration ready");
                    NarrationState::Ready {
                        slug: label,
                        narration,
                    }
                }
                Err(e) => {
                    warn!(target: "narration", slug = %label, error = %e, "Narration unavailable");
                    NarrationState::Failed {
                        slug: label,
                        error: e.to_string(),
                    }
                }
            });
            // A newer load bumps the generation before publishing Loading, so
            // checking under the channel lock keeps a stale result out.
            state.send_if_modified(|slot| {
                if current.load(Ordering::SeqCst) != generation {
                    return false;
                }
                match next.take() {
                    Some(value) => {
                        *slot = value;
                        true
                    }
                    None => false,
                }
            });
        }));
    }

    /// Clear a failure so the reader can retry
    pub fn dismiss_error(&mut self) {
        self.state.send_if_modified(|state| {
            if matches!(state, NarrationState::Failed { .. }) {
                *state = NarrationState::Idle;
                true
            } else {
                false
            }
        });
    }

    pub fn is_loading(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Abort the outstanding request and return to idle.
    pub fn teardown(&mut self) {
        self.cancel();
        self.state.send_replace(NarrationState::Idle);
    }

    fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ArticleView {
    fn drop(&mut self) {
        self.cancel();
    }
}
