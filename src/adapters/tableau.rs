use crate::domain::model::Workbook;
use crate::domain::ports::WorkbookService;
use crate::utils::error::{DegradationError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Oldest REST API version; also where `serverinfo` is queried.
pub const FALLBACK_API_VERSION: &str = "2.4";
const PAGE_SIZE: usize = 100;
const AUTH_HEADER: &str = "X-Tableau-Auth";
const JSON: &str = "application/json";
const XML: &str = "application/xml";

#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Password,
    /// Site content URL; empty for the default site.
    pub site: String,
}

// ---- wire formats ----

#[derive(Deserialize)]
struct ServerInfoEnvelope {
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
}

#[derive(Deserialize)]
struct ServerInfo {
    #[serde(rename = "restApiVersion")]
    rest_api_version: String,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    credentials: SignInCredentials<'a>,
}

#[derive(Serialize)]
struct SignInCredentials<'a> {
    name: &'a str,
    password: &'a str,
    site: SiteRef<'a>,
}

#[derive(Serialize)]
struct SiteRef<'a> {
    #[serde(rename = "contentUrl")]
    content_url: &'a str,
}

#[derive(Deserialize)]
struct SignInEnvelope {
    credentials: SignedIn,
}

#[derive(Deserialize)]
struct SignedIn {
    token: String,
    site: IdRef,
    user: IdRef,
}

#[derive(Deserialize, Default)]
struct IdRef {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct WorkbooksEnvelope {
    pagination: Pagination,
    #[serde(default)]
    workbooks: WorkbookList,
}

#[derive(Deserialize)]
struct Pagination {
    #[serde(rename = "totalAvailable")]
    total_available: String,
}

#[derive(Deserialize, Default)]
struct WorkbookList {
    #[serde(default)]
    workbook: Vec<WorkbookDto>,
}

#[derive(Deserialize)]
struct WorkbookEnvelope {
    workbook: WorkbookDto,
}

#[derive(Deserialize)]
struct WorkbookDto {
    id: String,
    name: String,
    #[serde(default)]
    project: IdRef,
}

impl From<WorkbookDto> for Workbook {
    fn from(dto: WorkbookDto) -> Self {
        Workbook {
            id: dto.id,
            name: dto.name,
            project_id: dto.project.id,
            project_name: dto.project.name,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    code: String,
}

// ---- client ----

/// A server address paired with the REST API version to speak to it.
pub struct TableauServer {
    client: Client,
    base_url: String,
    api_version: String,
}

impl TableauServer {
    /// Pins `api_version` when given, otherwise asks the server for the
    /// highest version it supports.
    pub async fn connect(server: &str, api_version: Option<&str>) -> Result<Self> {
        let client = Client::new();
        let base_url = server.trim_end_matches('/').to_string();

        let api_version = match api_version {
            Some(version) => version.to_string(),
            None => Self::highest_version(&client, &base_url).await?,
        };
        tracing::info!("Using REST API version {}", api_version);

        Ok(Self {
            client,
            base_url,
            api_version,
        })
    }

    async fn highest_version(client: &Client, base_url: &str) -> Result<String> {
        let url = format!("{}/api/{}/serverinfo", base_url, FALLBACK_API_VERSION);
        tracing::debug!("Querying server info: {}", url);
        let response = client.get(&url).header(ACCEPT, JSON).send().await?;

        // 舊版伺服器沒有 serverinfo
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(
                "Server info unavailable, falling back to REST API version {}",
                FALLBACK_API_VERSION
            );
            return Ok(FALLBACK_API_VERSION.to_string());
        }

        let info: ServerInfoEnvelope = read_json(check_status(response).await?).await?;
        Ok(info.server_info.rest_api_version)
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.api_version, path)
    }

    pub async fn sign_in(self, credentials: &Credentials) -> Result<Session> {
        let url = self.api_url("auth/signin");
        tracing::debug!("Signing in as {}: {}", credentials.username, url);

        let request = SignInRequest {
            credentials: SignInCredentials {
                name: &credentials.username,
                password: credentials.password.expose(),
                site: SiteRef {
                    content_url: &credentials.site,
                },
            },
        };
        let response = self
            .client
            .post(&url)
            .header(ACCEPT, JSON)
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DegradationError::AuthError {
                message: error_message(response).await,
            });
        }

        let envelope: SignInEnvelope = read_json(check_status(response).await?).await?;
        let signed_in = envelope.credentials;
        tracing::info!(
            "Signed in as {} (user {}) on site {}",
            credentials.username,
            signed_in.user.id,
            signed_in.site.id
        );

        Ok(Session {
            server: self,
            token: signed_in.token,
            site_id: signed_in.site.id,
            user_id: signed_in.user.id,
            signed_out: false,
        })
    }
}

/// An authenticated session. Call [`Session::sign_out`] once done with it.
pub struct Session {
    server: TableauServer,
    token: String,
    site_id: String,
    user_id: String,
    signed_out: bool,
}

impl Session {
    fn site_url(&self, path: &str) -> String {
        self.server
            .api_url(&format!("sites/{}/{}", self.site_id, path))
    }

    async fn get(&self, url: Url, accept: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        let response = self
            .server
            .client
            .get(url)
            .header(AUTH_HEADER, &self.token)
            .header(ACCEPT, accept)
            .send()
            .await?;
        Ok(response)
    }

    pub async fn sign_out(mut self) -> Result<()> {
        self.signed_out = true;
        let url = self.server.api_url("auth/signout");
        tracing::debug!("Signing out: {}", url);

        let response = self
            .server
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!("Signed out");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.signed_out {
            tracing::warn!("Session for user {} dropped without signing out", self.user_id);
        }
    }
}

#[async_trait]
impl WorkbookService for Session {
    async fn list_workbooks(&self) -> Result<Vec<Workbook>> {
        let mut workbooks = Vec::new();
        let mut page_number = 1usize;

        loop {
            let url = Url::parse_with_params(
                &self.site_url("workbooks"),
                &[
                    ("pageSize", PAGE_SIZE.to_string()),
                    ("pageNumber", page_number.to_string()),
                ],
            )?;
            let response = check_status(self.get(url, JSON).await?).await?;
            let page: WorkbooksEnvelope = read_json(response).await?;

            let total_available: usize =
                page.pagination
                    .total_available
                    .parse()
                    .map_err(|_| DegradationError::MalformedResponse {
                        message: format!(
                            "invalid totalAvailable '{}'",
                            page.pagination.total_available
                        ),
                    })?;
            let received = page.workbooks.workbook.len();
            workbooks.extend(page.workbooks.workbook.into_iter().map(Workbook::from));
            tracing::debug!(
                "Workbook page {}: {} received, {}/{} total",
                page_number,
                received,
                workbooks.len(),
                total_available
            );

            if received == 0 || workbooks.len() >= total_available {
                break;
            }
            page_number += 1;
        }

        Ok(workbooks)
    }

    async fn get_workbook(&self, workbook_id: &str) -> Result<Option<Workbook>> {
        let url = workbook_url(&self.site_url("workbooks"), workbook_id, &[])?;
        let response = self.get(url, JSON).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: WorkbookEnvelope = read_json(check_status(response).await?).await?;
        Ok(Some(envelope.workbook.into()))
    }

    async fn get_degradations(&self, workbook_id: &str, product_version: &str) -> Result<String> {
        let mut url = workbook_url(&self.site_url("workbooks"), workbook_id, &["downGradeInfo"])?;
        url.query_pairs_mut()
            .append_pair("productVersion", product_version);
        let response = check_status(self.get(url, XML).await?).await?;
        Ok(response.text().await?)
    }
}

/// `{workbooks_url}/{workbook_id}/{tail...}` with the id percent-encoded as
/// a single path segment.
fn workbook_url(workbooks_url: &str, workbook_id: &str, tail: &[&str]) -> Result<Url> {
    let mut url = Url::parse(workbooks_url)?;
    url.path_segments_mut()
        .map_err(|_| DegradationError::ConfigError {
            message: format!("server URL cannot carry a path: {}", workbooks_url),
        })?
        .push(workbook_id)
        .extend(tail);
    Ok(url)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(DegradationError::ServerError {
        status: status.as_u16(),
        message: error_message(response).await,
    })
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if let Some(message) = parse_error_message(&body) {
        return message;
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body
    }
}

/// Tableau 錯誤格式：`{"error": {"summary", "detail", "code"}}`
fn parse_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let error = envelope.error;

    let mut message = match (error.summary.is_empty(), error.detail.is_empty()) {
        (false, false) => format!("{}: {}", error.summary, error.detail),
        (false, true) => error.summary,
        (true, false) => error.detail,
        (true, true) => return None,
    };
    if !error.code.is_empty() {
        message.push_str(&format!(" (code {})", error.code));
    }
    Some(message)
}
