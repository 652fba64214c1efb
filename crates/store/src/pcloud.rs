//! pCloud REST adapter.
//!
//! Credential-pair authentication on every call; folder provisioning goes
//! through `createfolderifnotexists`, which is idempotent server-side, so
//! concurrent first-requests of a day cannot conflict.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{Context, Error, Result},
    remote::{FileId, FolderId, RemoteStore},
};

const DEFAULT_API_BASE: &str = "https://api.pcloud.com";

/// pCloud's root folder id.
const ROOT_FOLDER: FolderId = FolderId(0);

pub struct PcloudStore {
    http: reqwest::Client,
    api_base: String,
    username: String,
    password: Secret<String>,
}

#[derive(Deserialize)]
struct FolderResponse {
    result: i64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    metadata: Option<FolderMetadata>,
}

#[derive(Deserialize)]
struct FolderMetadata {
    folderid: u64,
}

#[derive(Deserialize)]
struct UploadResponse {
    result: i64,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    fileids: Vec<u64>,
}

impl PcloudStore {
    #[must_use]
    pub fn new(username: impl Into<String>, password: Secret<String>) -> Self {
        Self::with_api_base(username, password, DEFAULT_API_BASE)
    }

    /// Point the adapter at a different endpoint (tests).
    #[must_use]
    pub fn with_api_base(
        username: impl Into<String>,
        password: Secret<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            username: username.into(),
            password,
        }
    }

    async fn create_folder_if_not_exists(&self, parent: FolderId, name: &str) -> Result<FolderId> {
        let parent_param = parent.to_string();
        let response: FolderResponse = self
            .http
            .get(format!("{}/createfolderifnotexists", self.api_base))
            .query(&[
                ("username", self.username.as_str()),
                ("password", self.password.expose_secret().as_str()),
                ("folderid", parent_param.as_str()),
                ("name", name),
            ])
            .send()
            .await?
            .json()
            .await?;

        let metadata = check(response.result, response.error, response.metadata)?;
        debug!(name, parent = %parent, folderid = metadata.folderid, "ensured remote folder");
        Ok(FolderId(metadata.folderid))
    }
}

/// Map pCloud's `result` envelope onto `Result`, requiring a payload on
/// success.
fn check<T>(result: i64, error: Option<String>, payload: Option<T>) -> Result<T> {
    if result != 0 {
        return Err(Error::Api {
            code: result,
            message: error.unwrap_or_else(|| "unspecified error".to_string()),
        });
    }
    payload.context("malformed storage response: missing payload")
}

#[async_trait]
impl RemoteStore for PcloudStore {
    async fn ensure_path(&self, segments: &[&str]) -> Result<FolderId> {
        let mut current = ROOT_FOLDER;
        for segment in segments.iter().filter(|s| !s.is_empty()) {
            current = self.create_folder_if_not_exists(current, segment).await?;
        }
        Ok(current)
    }

    async fn upload(&self, folder: FolderId, filename: &str, bytes: Vec<u8>) -> Result<FileId> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let folder_param = folder.to_string();
        let response: UploadResponse = self
            .http
            .post(format!("{}/uploadfile", self.api_base))
            .query(&[
                ("username", self.username.as_str()),
                ("password", self.password.expose_secret().as_str()),
                ("folderid", folder_param.as_str()),
                ("nopartial", "1"),
            ])
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;

        let fileids = check(response.result, response.error, Some(response.fileids))?;
        let file_id = fileids
            .first()
            .copied()
            .context("upload failed: no file id returned")?;

        info!(filename, folder = %folder, file_id, size, "uploaded file");
        Ok(FileId(file_id))
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn store(server: &mockito::ServerGuard) -> PcloudStore {
        PcloudStore::with_api_base("me@example.com", Secret::new("pw".into()), server.url())
    }

    #[tokio::test]
    async fn ensure_path_walks_segments_in_order() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("GET", "/createfolderifnotexists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folderid".into(), "0".into()),
                Matcher::UrlEncoded("name".into(), "Music".into()),
                Matcher::UrlEncoded("username".into(), "me@example.com".into()),
            ]))
            .with_body(r#"{"result":0,"metadata":{"folderid":10}}"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/createfolderifnotexists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folderid".into(), "10".into()),
                Matcher::UrlEncoded("name".into(), "2026-08-07".into()),
            ]))
            .with_body(r#"{"result":0,"metadata":{"folderid":11}}"#)
            .create_async()
            .await;

        let folder = store(&server)
            .ensure_path(&["Music", "2026-08-07"])
            .await
            .unwrap();

        assert_eq!(folder, FolderId(11));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn ensure_path_skips_empty_segments() {
        let mut server = mockito::Server::new_async().await;
        let only = server
            .mock("GET", "/createfolderifnotexists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folderid".into(), "0".into()),
                Matcher::UrlEncoded("name".into(), "Music".into()),
            ]))
            .with_body(r#"{"result":0,"metadata":{"folderid":7}}"#)
            .expect(1)
            .create_async()
            .await;

        // A base folder like "/Music/" splits into empty edge segments.
        let folder = store(&server).ensure_path(&["", "Music", ""]).await.unwrap();
        assert_eq!(folder, FolderId(7));
        only.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_envelope_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/createfolderifnotexists")
            .match_query(Matcher::Any)
            .with_body(r#"{"result":2000,"error":"Log in failed."}"#)
            .create_async()
            .await;

        let err = store(&server).ensure_path(&["Music"]).await.unwrap_err();
        match err {
            Error::Api { code, message } => {
                assert_eq!(code, 2000);
                assert_eq!(message, "Log in failed.");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upload_returns_first_file_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/uploadfile")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folderid".into(), "11".into()),
                Matcher::UrlEncoded("nopartial".into(), "1".into()),
            ]))
            .with_body(r#"{"result":0,"fileids":[42],"metadata":[{"name":"song.mp3"}]}"#)
            .create_async()
            .await;

        let file = store(&server)
            .upload(FolderId(11), "song.mp3", b"ID3".to_vec())
            .await
            .unwrap();

        assert_eq!(file, FileId(42));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_without_file_id_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/uploadfile")
            .match_query(Matcher::Any)
            .with_body(r#"{"result":0,"fileids":[]}"#)
            .create_async()
            .await;

        let err = store(&server)
            .upload(FolderId(11), "song.mp3", Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no file id"));
    }
}
