use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};

/// An anonymous text host. Untrusted and best effort: uploads may be
/// rejected for size or rate and pastes may expire.
#[async_trait]
pub trait PasteHost: Send + Sync {
    /// Stores `text` and returns the id to fetch it back with.
    async fn upload(&self, text: String) -> Result<String>;

    async fn fetch(&self, id: &str) -> Result<String>;
}

/// Paste host speaking the plain protocol: `POST /` with a raw body answers
/// with the paste URL, `GET /{id}.txt` returns the raw text.
#[derive(Clone)]
pub struct HttpPasteHost {
    client: Client,
    base_url: String,
}

impl HttpPasteHost {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn is_valid_paste_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Pulls the id out of the URL the host answers with: the last path
/// segment, without any extension.
fn paste_id_from_response(body: &str) -> Option<String> {
    let url = body.trim().trim_end_matches('/');
    let url = url.split(['?', '#']).next()?;
    let segment = url.rsplit('/').next()?;
    let id = segment.split('.').next()?;
    is_valid_paste_id(id).then(|| id.to_string())
}

#[async_trait]
impl PasteHost for HttpPasteHost {
    async fn upload(&self, text: String) -> Result<String> {
        let size = text.len();
        let resp = self
            .client
            .post(&self.base_url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(text)
            .send()
            .await
            .map_err(|e| Error::ShareUploadFailed(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::ShareUploadFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::ShareUploadFailed(format!(
                "paste host answered {status}"
            )));
        }

        let id = paste_id_from_response(&body).ok_or_else(|| {
            Error::ShareUploadFailed(format!("unexpected paste host response: {}", body.trim()))
        })?;
        tracing::info!("uploaded {size} bytes to paste {id}");
        Ok(id)
    }

    async fn fetch(&self, id: &str) -> Result<String> {
        if !is_valid_paste_id(id) {
            return Err(Error::ImportFailed(format!("invalid paste id: {id}")));
        }

        let url = format!("{}/{id}.txt", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ImportFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ImportFailed(format!(
                "paste {id} not available ({status})"
            )));
        }

        resp.text()
            .await
            .map_err(|e| Error::ImportFailed(e.to_string()))
    }
}
