//! In-memory library of canned HTTP responses built from a directory tree
//!
//! Every regular file below the root is serialized once, at build time, into
//! a complete `200 OK` response and indexed by its URL path: the file's path
//! relative to the root's parent. Building from `./data` makes
//! `./data/foo/bar.zip` available as `/data/foo/bar.zip`.

pub mod file;


use crate::http::ResponseDescriptor;
use crate::proxy::ProxyHandler;
use crate::routing::RoutingDescriptor;
use crate::{FixtureError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use file::file_to_response;

/// Immutable mapping from URL path to serialized response
///
/// Cloning is cheap; clones share the same map.
#[derive(Debug, Clone)]
pub struct ResponseLibrary {
    root: PathBuf,
    responses: Arc<HashMap<String, Bytes>>,
}

impl ResponseLibrary {
    /// Walks `dir` and serializes every regular file below it.
    ///
    /// Symbolic links are followed. Any unreadable entry fails the whole
    /// build. This does blocking filesystem IO; call it before serving or
    /// from `spawn_blocking`.
    pub fn build(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = std::path::absolute(dir)
            .map(|root| clean_path(&root))
            .map_err(|source| FixtureError::Path {
                path: dir.to_path_buf(),
                source,
            })?;
        std::fs::metadata(&root).map_err(|source| FixtureError::Path {
            path: root.clone(),
            source,
        })?;

        let prefix = root.parent().unwrap_or(&root);
        let mut responses = HashMap::new();

        for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let key = url_path(prefix, entry.path())?;
            let response = file_to_response(entry.path())?;
            debug!(url_path = %key, size = response.len(), "Loaded resource");
            responses.insert(key, response);
        }

        info!(root = %root.display(), resources = responses.len(), "Response library built");

        Ok(Self {
            root,
            responses: Arc::new(responses),
        })
    }

    /// Absolute root directory the library was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, url_path: &str) -> Option<&Bytes> {
        self.responses.get(url_path)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// URL paths served by the library, in no particular order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(String::as_str)
    }

    pub fn into_handler(self) -> FileServer {
        FileServer::new(self)
    }
}

/// Resolves `.` and `..` components lexically, leaving symlinks untouched.
/// `..` at the root stays at the root.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Joins the components of `path` below `prefix` into a `/`-separated URL path
fn url_path(prefix: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(prefix).map_err(|_| {
        FixtureError::Config(format!(
            "{} is not below {}",
            path.display(),
            prefix.display()
        ))
    })?;

    let mut key = String::new();
    for component in relative.components() {
        key.push('/');
        key.push_str(&component.as_os_str().to_string_lossy());
    }
    Ok(key)
}

/// Handler serving a [`ResponseLibrary`]
///
/// The inbound stream is never read; the response is chosen by the
/// descriptor's URL path alone. Unknown paths get a bodiless
/// `404 Not Found` and nothing else.
#[derive(Debug, Clone)]
pub struct FileServer {
    library: ResponseLibrary,
}

impl FileServer {
    pub fn new(library: ResponseLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &ResponseLibrary {
        &self.library
    }
}

#[async_trait]
impl ProxyHandler for FileServer {
    async fn proxy(
        &self,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        _source: &mut (dyn AsyncRead + Send + Unpin),
        descriptor: &RoutingDescriptor,
    ) -> Result<()> {
        match self.library.get(&descriptor.url_path) {
            Some(response) => {
                debug!(%descriptor, size = response.len(), "Serving resource");
                sink.write_all(response).await?;
            }
            None => {
                warn!(%descriptor, "Resource not found");
                let not_found = ResponseDescriptor::not_found().serialize()?;
                sink.write_all(&not_found).await?;
            }
        }

        sink.flush().await?;
        Ok(())
    }
}
