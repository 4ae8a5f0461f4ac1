//! Request generation for the Live authorization and SkyDrive content APIs.
//!
//! Every logical operation maps to a [`RequestDescriptor`]: an HTTP method,
//! a path template with `{name}` placeholders, and parameters tagged by
//! where they travel. Nothing here performs I/O.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{DriveError, Result};
use crate::models::ROOT_FOLDER;
use crate::scope::Scope;

/// OAuth endpoints share one template, the verb selects the endpoint.
const OAUTH_RESOURCE: &str = "oauth20_{verb}.srf";
const AUTHORIZE_VERB: &str = "authorize";
const TOKEN_VERB: &str = "token";

const QUOTA_RESOURCE: &str = "me/skydrive/quota";

/// Multipart field carrying uploaded file content.
const FILE_FIELD: &str = "file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Non-standard verbs the content API accepts on top of a POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbOverride {
    Copy,
    Move,
}

impl VerbOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerbOverride::Copy => "COPY",
            VerbOverride::Move => "MOVE",
        }
    }
}

/// Where a parameter is placed in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Substituted into a `{name}` placeholder of the path template.
    UrlSegment,
    /// Query string for GET/DELETE or JSON/multipart requests, form body otherwise.
    QueryOrBody,
    /// Always sent in the query string.
    Query,
    /// Sent as an HTTP header.
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
}

/// Content of an uploaded file.
#[derive(Debug)]
pub enum AttachmentContent {
    Bytes(Bytes),
    Stream(reqwest::Body),
}

impl AttachmentContent {
    /// Length in bytes when known up front.
    pub fn len(&self) -> Option<u64> {
        match self {
            AttachmentContent::Bytes(bytes) => Some(bytes.len() as u64),
            AttachmentContent::Stream(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl From<Bytes> for AttachmentContent {
    fn from(bytes: Bytes) -> Self {
        AttachmentContent::Bytes(bytes)
    }
}

impl From<Vec<u8>> for AttachmentContent {
    fn from(bytes: Vec<u8>) -> Self {
        AttachmentContent::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for AttachmentContent {
    fn from(bytes: &'static [u8]) -> Self {
        AttachmentContent::Bytes(Bytes::from_static(bytes))
    }
}

impl From<reqwest::Body> for AttachmentContent {
    fn from(body: reqwest::Body) -> Self {
        AttachmentContent::Stream(body)
    }
}

/// A named file sent as a multipart part.
#[derive(Debug)]
pub struct FileAttachment {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub content: AttachmentContent,
}

/// Abstract HTTP request, built once per operation and consumed by the executor.
#[derive(Debug)]
pub struct RequestDescriptor {
    method: Method,
    verb_override: Option<VerbOverride>,
    resource: String,
    parameters: Vec<Parameter>,
    body: Option<Value>,
    file: Option<FileAttachment>,
}

impl RequestDescriptor {
    fn new(method: Method, resource: &str) -> Self {
        Self {
            method,
            verb_override: None,
            resource: normalize_path(resource),
            parameters: Vec::new(),
            body: None,
            file: None,
        }
    }

    fn add_parameter(&mut self, name: &str, value: &str, kind: ParameterKind) -> &mut Self {
        self.parameters.push(Parameter {
            name: name.to_string(),
            value: value.to_string(),
            kind,
        });
        self
    }

    fn add_url_segment(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_parameter(name, value, ParameterKind::UrlSegment)
    }

    fn add_param(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_parameter(name, value, ParameterKind::QueryOrBody)
    }

    fn add_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.add_parameter(name, value, ParameterKind::Header)
    }

    fn set_body<T: Serialize>(&mut self, body: &T) -> Result<()> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(())
    }

    /// Append a query-string parameter, whatever the method.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.add_parameter(name, value, ParameterKind::Query);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn verb_override(&self) -> Option<VerbOverride> {
        self.verb_override
    }

    /// The verb the server is meant to act on.
    pub fn effective_verb(&self) -> &'static str {
        self.verb_override
            .map(|verb| verb.as_str())
            .unwrap_or_else(|| self.method.as_str())
    }

    /// The path template, e.g. `/{id}/files`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.kind == ParameterKind::Header && p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.of_kind(ParameterKind::Header)
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn file(&self) -> Option<&FileAttachment> {
        self.file.as_ref()
    }

    /// Move the attachment out so its content can be handed to the transport.
    pub fn take_file(&mut self) -> Option<FileAttachment> {
        self.file.take()
    }

    /// True when `QueryOrBody` parameters travel as a form-encoded body.
    pub fn sends_form(&self) -> bool {
        matches!(self.method, Method::Post | Method::Put) && self.body.is_none() && self.file.is_none()
    }

    /// Parameters that end up in the query string.
    pub fn query_pairs(&self) -> Vec<(&str, &str)> {
        let sends_form = self.sends_form();
        self.parameters
            .iter()
            .filter(|p| match p.kind {
                ParameterKind::Query => true,
                ParameterKind::QueryOrBody => !sends_form,
                _ => false,
            })
            .map(|p| (p.name.as_str(), p.value.as_str()))
            .collect()
    }

    /// Parameters that end up in a form-encoded body.
    pub fn form_pairs(&self) -> Vec<(&str, &str)> {
        if !self.sends_form() {
            return Vec::new();
        }
        self.of_kind(ParameterKind::QueryOrBody).collect()
    }

    fn of_kind(&self, kind: ParameterKind) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .filter(move |p| p.kind == kind)
            .map(|p| (p.name.as_str(), p.value.as_str()))
    }

    /// Substitute url segments into the path template.
    ///
    /// # Panics
    ///
    /// Panics if a placeholder has no bound url segment. Every generator
    /// binds its placeholders, so this only fires on a programming error.
    pub fn render_path(&self) -> String {
        let mut rendered = String::with_capacity(self.resource.len());
        let mut rest = self.resource.as_str();

        while let Some(open) = rest.find('{') {
            let close = rest[open..]
                .find('}')
                .map(|offset| open + offset)
                .unwrap_or_else(|| panic!("unterminated placeholder in {}", self.resource));
            let name = &rest[open + 1..close];
            let value = self
                .parameters
                .iter()
                .find(|p| p.kind == ParameterKind::UrlSegment && p.name == name)
                .map(|p| p.value.as_str())
                .unwrap_or_else(|| panic!("no url segment bound for {{{}}} in {}", name, self.resource));

            rendered.push_str(&rest[..open]);
            rendered.push_str(value);
            rest = &rest[close + 1..];
        }
        rendered.push_str(rest);

        normalize_path(&rendered)
    }

    /// Build the absolute URL against `base`, including query parameters.
    pub fn build_url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base)?;
        let path = self.render_path();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| DriveError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
            segments.pop_if_empty();
            segments.extend(path.trim_start_matches('/').split('/'));
        }

        let query = self.query_pairs();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

/// Exactly one leading slash, no trailing slash.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_matches('/'))
}

fn require(name: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DriveError::ArgumentError(name));
    }
    Ok(())
}

fn or_root(id: Option<&str>) -> &str {
    match id {
        Some(id) if !id.is_empty() => id,
        _ => ROOT_FOLDER,
    }
}

#[derive(Serialize)]
struct FolderBody<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct DestinationBody<'a> {
    destination: &'a str,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

/// Maps operations onto request descriptors.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestGenerator;

impl RequestGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Browser-facing authorization request.
    pub fn authorize(&self, client_id: &str, redirect_uri: &str, scopes: &[Scope]) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(Method::Get, OAUTH_RESOURCE);
        request
            .add_url_segment("verb", AUTHORIZE_VERB)
            .add_param("client_id", client_id)
            .add_param("redirect_uri", redirect_uri)
            .add_param("scope", &Scope::join(scopes))
            .add_param("response_type", "code");
        request
    }

    /// Exchange an authorization code for a token pair.
    pub fn access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        authorization_code: &str,
    ) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(Method::Post, OAUTH_RESOURCE);
        request
            .add_url_segment("verb", TOKEN_VERB)
            .add_param("client_id", client_id)
            .add_param("redirect_uri", redirect_uri)
            .add_param("client_secret", client_secret)
            .add_param("code", authorization_code)
            .add_param("grant_type", "authorization_code");
        request
    }

    /// Exchange a refresh token for a new token pair.
    pub fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        refresh_token: &str,
    ) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(Method::Post, OAUTH_RESOURCE);
        request
            .add_url_segment("verb", TOKEN_VERB)
            .add_param("client_id", client_id)
            .add_param("redirect_uri", redirect_uri)
            .add_param("client_secret", client_secret)
            .add_param("refresh_token", refresh_token)
            .add_param("grant_type", "refresh_token");
        request
    }

    /// Metadata of a resource; no id means the root folder.
    pub fn get(&self, id: Option<&str>) -> RequestDescriptor {
        match id {
            Some(id) if !id.is_empty() => {
                let mut request = RequestDescriptor::new(Method::Get, "{id}");
                request.add_url_segment("id", id);
                request
            }
            _ => RequestDescriptor::new(Method::Get, ROOT_FOLDER),
        }
    }

    /// Children of a folder; no id means the root folder.
    pub fn get_contents(&self, id: Option<&str>) -> RequestDescriptor {
        let mut request = RequestDescriptor::new(Method::Get, "{id}/files");
        request.add_url_segment("id", or_root(id));
        request
    }

    pub fn quota(&self) -> RequestDescriptor {
        RequestDescriptor::new(Method::Get, QUOTA_RESOURCE)
    }

    pub fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<RequestDescriptor> {
        require("parent_id", parent_id)?;
        require("name", name)?;

        let mut request = RequestDescriptor::new(Method::Post, "{id}");
        request.add_url_segment("id", parent_id);
        request.set_body(&FolderBody {
            name,
            description: description.unwrap_or_default(),
        })?;
        Ok(request)
    }

    /// Create or overwrite a file named `name` under `parent_id`.
    pub fn write(
        &self,
        parent_id: &str,
        content: impl Into<AttachmentContent>,
        name: &str,
        content_type: &str,
    ) -> Result<RequestDescriptor> {
        require("parent_id", parent_id)?;
        require("name", name)?;

        let mut request = RequestDescriptor::new(Method::Post, "{id}/files");
        request.add_url_segment("id", parent_id);
        request.file = Some(FileAttachment {
            field: FILE_FIELD.to_string(),
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            content: content.into(),
        });
        Ok(request)
    }

    /// Inclusive byte range of a file's content.
    pub fn read(&self, id: &str, start_byte: u64, end_byte: u64) -> Result<RequestDescriptor> {
        require("id", id)?;

        let mut request = RequestDescriptor::new(Method::Get, "{id}/content");
        request
            .add_url_segment("id", id)
            .add_header("Range", &format!("bytes={}-{}", start_byte, end_byte));
        Ok(request)
    }

    /// Whole content of a file.
    pub fn download(&self, id: &str) -> Result<RequestDescriptor> {
        require("id", id)?;

        let mut request = RequestDescriptor::new(Method::Get, "{id}/content");
        request.add_url_segment("id", id);
        Ok(request)
    }

    pub fn copy_to(&self, id: &str, new_parent_id: &str) -> Result<RequestDescriptor> {
        self.relocate(id, new_parent_id, VerbOverride::Copy)
    }

    pub fn move_to(&self, id: &str, new_parent_id: &str) -> Result<RequestDescriptor> {
        self.relocate(id, new_parent_id, VerbOverride::Move)
    }

    fn relocate(&self, id: &str, new_parent_id: &str, verb: VerbOverride) -> Result<RequestDescriptor> {
        require("id", id)?;
        require("new_parent_id", new_parent_id)?;

        let mut request = RequestDescriptor::new(Method::Post, "{id}");
        request.verb_override = Some(verb);
        request.add_url_segment("id", id);
        request.set_body(&DestinationBody {
            destination: new_parent_id,
        })?;
        Ok(request)
    }

    pub fn rename(&self, id: &str, name: &str) -> Result<RequestDescriptor> {
        require("id", id)?;
        require("name", name)?;

        let mut request = RequestDescriptor::new(Method::Put, "{id}");
        request.add_url_segment("id", id);
        request.set_body(&RenameBody { name })?;
        Ok(request)
    }

    pub fn delete(&self, id: &str) -> Result<RequestDescriptor> {
        require("id", id)?;

        let mut request = RequestDescriptor::new(Method::Delete, "{id}");
        request.add_url_segment("id", id);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("me/skydrive"), "/me/skydrive");
        assert_eq!(normalize_path("//123/files//"), "/123/files");
        assert_eq!(normalize_path(" /oauth20_token.srf "), "/oauth20_token.srf");
    }

    #[test]
    fn test_render_path_substitutes_segments() {
        let mut request = RequestDescriptor::new(Method::Get, "{id}/files");
        request.add_url_segment("id", "folder.abc!12");
        assert_eq!(request.render_path(), "/folder.abc!12/files");
    }

    #[test]
    #[should_panic(expected = "no url segment bound")]
    fn test_render_path_unbound_placeholder_panics() {
        let request = RequestDescriptor::new(Method::Get, "{id}/content");
        request.render_path();
    }

    #[test]
    fn test_form_only_for_plain_post() {
        let generator = RequestGenerator::new();
        let token = generator.access_token("id", "secret", "uri", "code");
        assert!(token.sends_form());
        assert!(token.query_pairs().is_empty());
        assert_eq!(token.form_pairs().len(), 5);

        let folder = generator.create_folder("123", "folder", None).unwrap();
        assert!(!folder.sends_form());
    }

    #[test]
    fn test_query_parameter_always_in_query() {
        let generator = RequestGenerator::new();
        let request = generator
            .create_folder("123", "folder", None)
            .unwrap()
            .with_query("access_token", "tok");
        let url = request.build_url("https://apis.live.net/v5.0/").unwrap();
        assert_eq!(url.as_str(), "https://apis.live.net/v5.0/123?access_token=tok");
    }

    #[test]
    fn test_build_url_encodes_reserved_characters() {
        let generator = RequestGenerator::new();
        let url = generator
            .get(Some("a b?c"))
            .build_url("http://localhost")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost/a%20b%3Fc");
    }
}
