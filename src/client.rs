//! SkyDrive API client.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Body, Client};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::auth::{Credentials, TokenStore};
use crate::config::ClientConfig;
use crate::error::{DriveError, Result};
use crate::executor::Executor;
use crate::models::{Resource, ResourceList, UserQuota};
use crate::request::{AttachmentContent, RequestGenerator};
use crate::scope::Scope;

/// Client for a user's SkyDrive.
///
/// Each call builds one request, decorates it with the current access
/// token and executes it. Nothing is retried: on a 401 the caller decides
/// whether to [`refresh_access_token`](Self::refresh_access_token) and try again.
#[derive(Debug)]
pub struct SkyDriveClient {
    generator: RequestGenerator,
    tokens: TokenStore,
    content: Executor,
}

impl SkyDriveClient {
    /// Create a new SkyDriveClient.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        let initial = Credentials::new(
            config.access_token.clone().unwrap_or_default(),
            config.refresh_token.clone(),
        );
        let authorization = Executor::new(http.clone(), config.auth_base_url.as_str(), config.verb_override);
        let tokens = TokenStore::new(config.app.clone(), authorization, initial);
        let content = Executor::new(http, config.content_base_url.as_str(), config.verb_override)
            .with_authenticator(tokens.authenticator());

        Ok(Self {
            generator: RequestGenerator::new(),
            tokens,
            content,
        })
    }

    /// URL the user opens in a browser to grant `scopes`.
    pub fn authorization_url(&self, scopes: &[Scope]) -> Result<String> {
        let app = self.tokens.app();
        let request = self.generator.authorize(&app.client_id, &app.redirect_uri, scopes);
        Ok(request.build_url(self.tokens.authorization_base_url())?.to_string())
    }

    /// Exchange the code from the authorization redirect for tokens.
    /// Subsequent content requests use the new access token.
    #[instrument(skip_all)]
    pub async fn get_access_token(&self, authorization_code: &str) -> Result<Credentials> {
        self.tokens.exchange_code(authorization_code).await
    }

    /// Mint a new access token from the stored refresh token.
    #[instrument(skip_all)]
    pub async fn refresh_access_token(&self) -> Result<Credentials> {
        self.tokens.refresh().await
    }

    /// Current credentials, e.g. to persist them between sessions.
    pub async fn credentials(&self) -> Arc<Credentials> {
        self.tokens.current().await
    }

    /// Metadata of a resource, or of the root folder when `id` is `None` or empty.
    #[instrument(skip(self))]
    pub async fn get(&self, id: Option<&str>) -> Result<Resource> {
        self.content.execute_json(self.generator.get(id)).await
    }

    /// Children of a folder, or of the root folder when `id` is `None` or empty.
    #[instrument(skip(self))]
    pub async fn get_contents(&self, id: Option<&str>) -> Result<Vec<Resource>> {
        let list: ResourceList = self.content.execute_json(self.generator.get_contents(id)).await?;
        Ok(list.data)
    }

    #[instrument(skip(self))]
    pub async fn get_quota(&self) -> Result<UserQuota> {
        self.content.execute_json(self.generator.quota()).await
    }

    #[instrument(skip(self))]
    pub async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Resource> {
        let request = self.generator.create_folder(parent_id, name, description)?;
        self.content.execute_json(request).await
    }

    /// Create an empty file.
    pub async fn create_file(&self, parent_id: &str, name: &str, content_type: &str) -> Result<Resource> {
        self.write(parent_id, Bytes::new(), name, content_type).await
    }

    /// Create or overwrite a file from an in-memory buffer.
    #[instrument(skip(self, content))]
    pub async fn write(
        &self,
        parent_id: &str,
        content: impl Into<Bytes>,
        name: &str,
        content_type: &str,
    ) -> Result<Resource> {
        self.write_content(parent_id, AttachmentContent::Bytes(content.into()), name, content_type)
            .await
    }

    /// Create or overwrite a file from a reader, streaming its content.
    #[instrument(skip(self, reader))]
    pub async fn write_stream<R>(
        &self,
        parent_id: &str,
        reader: R,
        name: &str,
        content_type: &str,
    ) -> Result<Resource>
    where
        R: AsyncRead + Send + 'static,
    {
        let body = Body::wrap_stream(ReaderStream::new(reader));
        self.write_content(parent_id, AttachmentContent::Stream(body), name, content_type)
            .await
    }

    async fn write_content(
        &self,
        parent_id: &str,
        content: AttachmentContent,
        name: &str,
        content_type: &str,
    ) -> Result<Resource> {
        let request = self.generator.write(parent_id, content, name, content_type)?;
        self.content.execute_json(request).await
    }

    /// Upload a local file into a folder, keeping its file name.
    ///
    /// An existing file with the same name is overwritten.
    pub async fn upload_file<P: AsRef<Path>>(&self, local_path: P, parent_id: &str) -> Result<Resource> {
        let local_path = local_path.as_ref();
        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DriveError::FileNotFound(local_path.display().to_string()))?;

        if !local_path.is_file() {
            return Err(DriveError::FileNotFound(local_path.display().to_string()));
        }

        let mime_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();
        let file = File::open(local_path).await?;

        self.write_stream(parent_id, file, filename, &mime_type).await
    }

    /// Bytes `start_byte..=end_byte` of a file.
    #[instrument(skip(self))]
    pub async fn read(&self, id: &str, start_byte: u64, end_byte: u64) -> Result<Bytes> {
        let request = self.generator.read(id, start_byte, end_byte)?;
        self.content.execute_bytes(request).await
    }

    /// Download a file to a local path.
    ///
    /// If `destination` is a directory the file keeps its remote name.
    #[instrument(skip(self, destination))]
    pub async fn download_file<P: AsRef<Path>>(&self, id: &str, destination: P) -> Result<Resource> {
        let destination = destination.as_ref();
        let request = self.generator.download(id)?;

        // Get file metadata first
        let metadata = self.get(Some(id)).await?;

        let final_path = if destination.is_dir() {
            destination.join(&metadata.name)
        } else {
            destination.to_path_buf()
        };

        let response = self.content.send(request).await?;

        let mut file = File::create(&final_path).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(metadata)
    }

    /// Copy a file into another folder; returns the copy.
    #[instrument(skip(self))]
    pub async fn copy_to(&self, id: &str, new_parent_id: &str) -> Result<Resource> {
        let request = self.generator.copy_to(id, new_parent_id)?;
        self.content.execute_json(request).await
    }

    /// Move a file or folder into another folder; returns the moved resource.
    #[instrument(skip(self))]
    pub async fn move_to(&self, id: &str, new_parent_id: &str) -> Result<Resource> {
        let request = self.generator.move_to(id, new_parent_id)?;
        self.content.execute_json(request).await
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: &str, name: &str) -> Result<Resource> {
        let request = self.generator.rename(id, name)?;
        self.content.execute_json(request).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let request = self.generator.delete(id)?;
        self.content.execute(request).await
    }
}
