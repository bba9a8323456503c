use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use thiserror::Error;

use crate::archive::has_archive_magic;
use crate::config::{ImageQuality, RemoteConfig};

use super::models::{ItemListResponse, OpenNotebookResponse, RemoteItem, RenderSession};

const NOTES_PATH: &str = "kindle-notebook/api/notes";
const OPEN_NOTEBOOK_PATH: &str = "openNotebook";
const RENDER_PAGE_PATH: &str = "renderPage";
const RENDERING_TOKEN_HEADER: &str = "x-amzn-karamel-notebook-rendering-token";

const ACCEPT_JSON: &str = "application/json";
const ACCEPT_TAR: &str = "application/x-tar";

/// Client for the notebook service's web API
pub struct ScribeClient {
    client: Client,
    base_url: String,
    config: RemoteConfig,
    session_credential: String,
    image_quality: ImageQuality,
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Session credential rejected; sign in to the web reader again and refresh your session credential")]
    AuthFailed,
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
    #[error("No rendering token returned for notebook {0}")]
    RenderingUnavailable(String),
    #[error("Render endpoint returned a non-archive payload ({length} bytes, starting {preview:?})")]
    InvalidPayload { length: usize, preview: String },
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ScribeClient {
    /// Create a new client
    pub fn new(
        config: RemoteConfig,
        session_credential: String,
        image_quality: ImageQuality,
    ) -> Result<Self, RemoteError> {
        // Normalize URL - ensure no trailing slash
        let base_url = config.base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
            session_credential,
            image_quality,
        })
    }

    /// Build full URL for a path
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET request carrying the session cookie and client-identification headers
    fn get(&self, url: &str, accept: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(CONTENT_TYPE, ACCEPT_JSON)
            .header(ACCEPT, accept)
            .header(ORIGIN, &self.config.origin)
            .header(REFERER, &self.config.referer)
            .header(USER_AGENT, &self.config.user_agent)
            .header(COOKIE, &self.session_credential)
    }

    /// Test whether the session credential is still accepted.
    ///
    /// Only transport failures are errors; an expired session, a redirect to
    /// the sign-in page or any other non-data answer yields `false`.
    pub async fn verify_session(&self) -> Result<bool, RemoteError> {
        let response = self.get(&self.url(NOTES_PATH), ACCEPT_JSON).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::info!("Session check: rejected with status {}", status);
            return Ok(false);
        }
        if is_sign_in_url(response.url()) {
            log::info!("Session check: redirected to sign-in page");
            return Ok(false);
        }
        if !status.is_success() {
            log::warn!("Session check: unexpected status {}", status);
            return Ok(false);
        }

        let body = response.text().await?;
        match parse_item_list(&body) {
            Ok(_) => Ok(true),
            Err(message) => {
                log::info!("Session check: {}", message);
                Ok(false)
            }
        }
    }

    /// Fetch the remote item tree
    pub async fn list_notebooks(&self) -> Result<Vec<RemoteItem>, RemoteError> {
        let response = self.get(&self.url(NOTES_PATH), ACCEPT_JSON).send().await?;
        let response = check_status(response).await?;

        if is_sign_in_url(response.url()) {
            return Err(RemoteError::AuthFailed);
        }

        let body = response.text().await?;
        let items = parse_item_list(&body).map_err(|message| RemoteError::InvalidResponse {
            endpoint: NOTES_PATH.to_string(),
            message,
        })?;

        log::debug!("list_notebooks: {} top-level item(s)", items.len());
        Ok(items)
    }

    /// Open a notebook, obtaining a rendering token and its metadata
    pub async fn open_notebook(&self, notebook_id: &str) -> Result<RenderSession, RemoteError> {
        let response = self
            .get(&self.url(OPEN_NOTEBOOK_PATH), ACCEPT_JSON)
            .query(&[
                ("notebookId", notebook_id),
                ("marketplaceId", self.config.marketplace_id.as_str()),
            ])
            .send()
            .await?;
        let response = check_status(response).await?;

        if is_sign_in_url(response.url()) {
            return Err(RemoteError::AuthFailed);
        }

        let body = response.text().await?;
        let opened = parse_open_response(&body).map_err(|message| RemoteError::InvalidResponse {
            endpoint: OPEN_NOTEBOOK_PATH.to_string(),
            message,
        })?;

        let rendering_token = opened
            .rendering_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RemoteError::RenderingUnavailable(notebook_id.to_string()))?;

        // Without metadata the page count is unknown, and a zero-page
        // default would render an empty note over the existing one
        let metadata = opened.metadata.ok_or_else(|| RemoteError::InvalidResponse {
            endpoint: OPEN_NOTEBOOK_PATH.to_string(),
            message: format!("no metadata returned for notebook {}", notebook_id),
        })?;

        log::debug!(
            "open_notebook: {} opened ({} page(s))",
            notebook_id,
            metadata.total_pages
        );

        Ok(RenderSession {
            notebook_id: notebook_id.to_string(),
            rendering_token,
            reading_session_id: opened.reading_session_id,
            metadata,
        })
    }

    /// Fetch every page of an opened notebook as one ustar bundle.
    ///
    /// The endpoint sometimes answers 200 with an HTML error page, so the
    /// payload must carry the ustar magic before it is returned.
    pub async fn fetch_pages(&self, session: &RenderSession) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .get(&self.url(RENDER_PAGE_PATH), ACCEPT_TAR)
            .query(&render_query(session, &self.config, self.image_quality))
            .header(RENDERING_TOKEN_HEADER, &session.rendering_token)
            .send()
            .await?;
        let response = check_status(response).await?;

        let data = response.bytes().await?.to_vec();
        verify_archive_payload(&data)?;

        log::debug!(
            "fetch_pages: {} bytes for notebook {}",
            data.len(),
            session.notebook_id
        );
        Ok(data)
    }
}

/// Map auth failures and non-success statuses to errors
async fn check_status(response: Response) -> Result<Response, RemoteError> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RemoteError::AuthFailed),
        status if !status.is_success() => Err(RemoteError::Server {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
        _ => Ok(response),
    }
}

fn is_sign_in_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    path.contains("/ap/signin") || path.contains("/signin") || path.contains("/login")
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    head.starts_with('<')
}

/// Parse the listing body, describing why it is not application data
pub(crate) fn parse_item_list(body: &str) -> Result<Vec<RemoteItem>, String> {
    if looks_like_html(body) {
        return Err("received an HTML page instead of the item list (sign-in required?)".to_string());
    }

    let response: ItemListResponse =
        serde_json::from_str(body).map_err(|e| format!("response is not valid JSON: {}", e))?;

    response
        .items_list
        .ok_or_else(|| "response has no itemsList field".to_string())
}

pub(crate) fn parse_open_response(body: &str) -> Result<OpenNotebookResponse, String> {
    if looks_like_html(body) {
        return Err("received an HTML page instead of notebook data".to_string());
    }
    serde_json::from_str(body).map_err(|e| format!("response is not valid JSON: {}", e))
}

/// Query for pages `0..total_pages-1` at the configured geometry
pub(crate) fn render_query(
    session: &RenderSession,
    config: &RemoteConfig,
    quality: ImageQuality,
) -> Vec<(&'static str, String)> {
    let end_page = session.metadata.total_pages.saturating_sub(1);
    vec![
        ("startPage", "0".to_string()),
        ("endPage", end_page.to_string()),
        ("width", config.page_width.to_string()),
        ("height", config.page_height.to_string()),
        ("dpi", quality.dpi().to_string()),
    ]
}

pub(crate) fn verify_archive_payload(data: &[u8]) -> Result<(), RemoteError> {
    if !data.is_empty() && has_archive_magic(data) {
        return Ok(());
    }

    let preview: String = String::from_utf8_lossy(&data[..data.len().min(32)]).into_owned();
    log::error!(
        "Invalid archive payload: {} bytes, starting {:?}",
        data.len(),
        preview
    );
    Err(RemoteError::InvalidPayload {
        length: data.len(),
        preview,
    })
}
