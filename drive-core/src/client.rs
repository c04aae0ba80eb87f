use std::collections::BTreeSet;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::query::{EntryKind, FOLDER_MIME_TYPE, FileQuery};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const VIEW_BASE_URL: &str = "https://drive.google.com/uc";
const ENTRY_FIELDS: &str = "nextPageToken,files(id,name,parents,mimeType,createdTime,thumbnailLink)";
const DEFAULT_PAGE_SIZE: u32 = 100;
const MULTIPART_BOUNDARY: &str = "skuphotos_part_boundary";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("bearer token is missing")]
    MissingToken,
    #[error("entry {id} has invalid createdTime: {source}")]
    Timestamp {
        id: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("entry {0} has no createdTime")]
    MissingCreatedTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    base_url: Url,
    token: String,
    page_size: u32,
}

impl DriveClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DriveError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DriveError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DriveError::MissingToken);
        }
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn list_page(
        &self,
        query: &FileQuery,
        page_token: Option<&str>,
    ) -> Result<FileList, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.to_query_string());
            pairs.append_pair("fields", ENTRY_FIELDS);
            let page_size = query.limit.unwrap_or(self.page_size);
            pairs.append_pair("pageSize", &page_size.to_string());
            if let Some(order_by) = query.order_by {
                pairs.append_pair("orderBy", order_by.as_param());
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn list_all(&self, query: &FileQuery) -> Result<Vec<RemoteEntry>, DriveError> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(query, page_token.as_deref()).await?;
            for file in page.files {
                entries.push(file.into_entry()?);
            }
            if let Some(limit) = query.limit {
                if entries.len() >= limit as usize {
                    entries.truncate(limit as usize);
                    break;
                }
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(entries)
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        url.query_pairs_mut().append_pair("fields", "id");
        let metadata = FileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: parent.map(|id| vec![id]),
        };
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .json(&metadata)
            .send()
            .await?;
        let created: CreatedFile = Self::handle_response(response).await?;
        Ok(created.id)
    }

    pub async fn delete_file(&self, id: &str) -> Result<(), DriveError> {
        let url = self.file_endpoint("/drive/v3/files", id)?;
        let response = self
            .http
            .delete(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(DriveError::Api { status, body })
    }

    pub async fn rename_file(&self, id: &str, name: &str) -> Result<(), DriveError> {
        let mut url = self.file_endpoint("/drive/v3/files", id)?;
        url.query_pairs_mut().append_pair("fields", "id");
        let response = self
            .http
            .patch(url)
            .header("Authorization", self.auth_header_value())
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        let _: CreatedFile = Self::handle_response(response).await?;
        Ok(())
    }

    pub async fn upload_file(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        let mut url = self.endpoint("/upload/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", "id");
        let metadata = FileMetadata {
            name,
            mime_type: Some(mime_type),
            parents: Some(vec![parent]),
        };
        let body = multipart_related_body(&serde_json::to_vec(&metadata)?, mime_type, &bytes);
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .header(
                "Content-Type",
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        let created: CreatedFile = Self::handle_response(response).await?;
        Ok(created.id)
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DriveError> {
        Ok(self.base_url.join(path)?)
    }

    fn file_endpoint(&self, collection: &str, id: &str) -> Result<Url, DriveError> {
        self.endpoint(&format!("{collection}/{id}"))
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }
}

/// Browser link that renders the stored image.
pub fn view_url(id: &str) -> String {
    format!("{VIEW_BASE_URL}?export=view&id={id}")
}

fn multipart_related_body(metadata: &[u8], mime_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + bytes.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--").as_bytes());
    body
}

impl DriveError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            DriveError::Api { status, .. } => Some(classify_api_status(*status)),
            DriveError::MissingToken => Some(ApiErrorClass::Auth),
            _ => None,
        }
    }
}

fn classify_api_status(status: StatusCode) -> ApiErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ApiErrorClass::Auth
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ApiErrorClass::RateLimit
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ApiErrorClass::Transient
    } else {
        ApiErrorClass::Permanent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub parent_ids: BTreeSet<String>,
    pub kind: EntryKind,
    pub mime_type: String,
    pub created_at: OffsetDateTime,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    pub mime_type: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
}

impl DriveFile {
    fn into_entry(self) -> Result<RemoteEntry, DriveError> {
        let created = self
            .created_time
            .as_deref()
            .ok_or_else(|| DriveError::MissingCreatedTime(self.id.clone()))?;
        let created_at =
            OffsetDateTime::parse(created, &Rfc3339).map_err(|source| DriveError::Timestamp {
                id: self.id.clone(),
                source,
            })?;
        Ok(RemoteEntry {
            kind: EntryKind::from_mime_type(&self.mime_type),
            parent_ids: self.parents.into_iter().collect(),
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
            created_at,
            thumbnail_url: self.thumbnail_link,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}
