//! Sends request descriptors over HTTP and classifies the outcome.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Authenticator;
use crate::config::VerbOverrideStyle;
use crate::error::{DriveError, Result};
use crate::request::{AttachmentContent, FileAttachment, Method, RequestDescriptor};

/// Header the content API reads the intended verb from on a POST.
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Statuses the API uses to report a failed call. Everything else,
/// including redirects the transport did not follow, counts as success.
pub fn is_failure(status: StatusCode) -> bool {
    matches!(status.as_u16(), 400 | 401 | 500 | 502)
}

/// Executes requests against one host.
#[derive(Debug, Clone)]
pub struct Executor {
    http: Client,
    base_url: String,
    authenticator: Option<Authenticator>,
    verb_override: VerbOverrideStyle,
}

impl Executor {
    pub fn new(http: Client, base_url: impl Into<String>, verb_override: VerbOverrideStyle) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            authenticator: None,
            verb_override,
        }
    }

    /// Decorate every request sent through this executor.
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send and deserialize the JSON response body.
    ///
    /// A successful response without a body yields `T::default()`.
    pub async fn execute_json<T: DeserializeOwned + Default>(&self, request: RequestDescriptor) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send and return the raw response body.
    pub async fn execute_bytes(&self, request: RequestDescriptor) -> Result<Bytes> {
        let response = self.send(request).await?;
        Ok(response.bytes().await?)
    }

    /// Send and discard the response body.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<()> {
        self.send(request).await?;
        Ok(())
    }

    /// Send and hand back the response once its status is classified as success.
    pub async fn send(&self, request: RequestDescriptor) -> Result<Response> {
        let mut request = match &self.authenticator {
            Some(authenticator) => authenticator.authenticate(request).await,
            None => request,
        };

        let url = request.build_url(&self.base_url)?;
        let method = self.http_method(&request);
        debug!(
            method = %method,
            verb = request.effective_verb(),
            path = url.path(),
            "sending request"
        );

        let mut builder = self.http.request(method, url);

        if let (Some(verb), VerbOverrideStyle::Header) = (request.verb_override(), self.verb_override) {
            builder = builder.header(METHOD_OVERRIDE_HEADER, verb.as_str());
        }
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let form = request.form_pairs();
        if !form.is_empty() {
            builder = builder.form(&form);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(file) = request.take_file() {
            builder = builder.multipart(multipart_form(file)?);
        }

        let response = builder.send().await?;
        check_status(response).await
    }

    fn http_method(&self, request: &RequestDescriptor) -> reqwest::Method {
        if let (Some(verb), VerbOverrideStyle::Verb) = (request.verb_override(), self.verb_override) {
            return reqwest::Method::from_bytes(verb.as_str().as_bytes())
                .expect("COPY and MOVE are valid method tokens");
        }
        match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

fn multipart_form(file: FileAttachment) -> Result<Form> {
    let part = match file.content {
        AttachmentContent::Bytes(bytes) => {
            let length = bytes.len() as u64;
            Part::stream_with_length(Body::from(bytes), length)
        }
        AttachmentContent::Stream(body) => Part::stream(body),
    };

    let content_type = if file.content_type.is_empty() {
        DEFAULT_CONTENT_TYPE
    } else {
        file.content_type.as_str()
    };
    let part = part.file_name(file.file_name).mime_str(content_type)?;

    Ok(Form::new().part(file.field, part))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    debug!(status = status.as_u16(), "received response");

    if is_failure(status) {
        let body = response.bytes().await?;
        return Err(DriveError::RequestFailure {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    Ok(response)
}
