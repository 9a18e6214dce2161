//! File operations relayed to the in-pod file browser.

use super::FileRequestError;
use axum::body::Bytes;
use std::fmt;

/// HTTP method used for an upstream file call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl RequestMethod {
    /// Returns the method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// A file-browser operation the relay is allowed to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileOperation {
    /// Directory tree listing.
    Tree,
    /// File content read.
    Content,
    /// File metadata.
    Info,
    /// File write.
    Write,
    /// File or directory removal.
    Delete,
    /// Directory creation.
    Mkdir,
}

impl FileOperation {
    /// Returns the upstream method.
    #[must_use]
    pub const fn method(self) -> RequestMethod {
        match self {
            Self::Tree | Self::Content | Self::Info => RequestMethod::Get,
            Self::Write | Self::Mkdir => RequestMethod::Post,
            Self::Delete => RequestMethod::Delete,
        }
    }

    /// Returns the upstream path.
    #[must_use]
    pub const fn upstream_path(self) -> &'static str {
        match self {
            Self::Tree => "/files/tree",
            Self::Content => "/files/content",
            Self::Info => "/files/info",
            Self::Write => "/files/write",
            Self::Delete => "/files",
            Self::Mkdir => "/files/mkdir",
        }
    }

    /// Returns whether a non-empty `path` query parameter is mandatory.
    #[must_use]
    pub const fn requires_path(self) -> bool {
        matches!(self, Self::Content | Self::Info | Self::Delete)
    }

    /// Returns whether a request body is mandatory.
    #[must_use]
    pub const fn requires_body(self) -> bool {
        matches!(self, Self::Write | Self::Mkdir)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Content => "content",
            Self::Info => "info",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Mkdir => "mkdir",
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated file request ready to forward verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    operation: FileOperation,
    query: Option<String>,
    body: Bytes,
    content_type: Option<String>,
}

impl FileRequest {
    /// Validates a client request.
    ///
    /// `path` is the decoded `path` query parameter and `query` the raw
    /// query string, which is forwarded unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FileRequestError::MissingPath`] or
    /// [`FileRequestError::MissingBody`] when the operation's required
    /// input is absent.
    pub fn new(
        operation: FileOperation,
        path: Option<&str>,
        query: Option<String>,
        body: Bytes,
    ) -> Result<Self, FileRequestError> {
        if operation.requires_path() && path.is_none_or(|value| value.trim().is_empty()) {
            return Err(FileRequestError::MissingPath(operation));
        }
        if operation.requires_body() && body.is_empty() {
            return Err(FileRequestError::MissingBody(operation));
        }
        Ok(Self {
            operation,
            query: query.filter(|raw| !raw.is_empty()),
            body,
            content_type: None,
        })
    }

    /// Sets the content type forwarded with the body.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the operation.
    #[must_use]
    pub const fn operation(&self) -> FileOperation {
        self.operation
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the request body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the forwarded content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the upstream path including the query string.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        let path = self.operation.upstream_path();
        self.query
            .as_deref()
            .map_or_else(|| path.to_owned(), |query| format!("{path}?{query}"))
    }
}

/// Upstream response relayed byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    /// Upstream status code.
    pub status: u16,
    /// Upstream content type.
    pub content_type: Option<String>,
    /// Upstream body.
    pub body: Bytes,
}
