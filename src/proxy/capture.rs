//! Per-session capture files.
//!
//! Each session writes the bytes it forwarded to the origin into `<id>_req`
//! and the bytes it returned to the client into `<id>_res`, both inside the
//! configured capture directory.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{ProxyError, ProxyResult};
use crate::net::CorrelationId;

/// Path of the request capture for `id`.
pub fn request_path(directory: &Path, id: CorrelationId) -> PathBuf {
    directory.join(format!("{id}_req"))
}

/// Path of the response capture for `id`.
pub fn response_path(directory: &Path, id: CorrelationId) -> PathBuf {
    directory.join(format!("{id}_res"))
}

/// The two open capture files of a session.
#[derive(Debug)]
pub struct Capture {
    pub request: File,
    pub response: File,
}

impl Capture {
    /// Create (truncating) both files. If the response file cannot be created
    /// the request file is left on disk, empty.
    pub async fn create(directory: &Path, id: CorrelationId) -> ProxyResult<Self> {
        let request = create_file(request_path(directory, id)).await?;
        let response = create_file(response_path(directory, id)).await?;
        Ok(Self { request, response })
    }

    /// Push everything written so far down to the operating system.
    pub async fn finish(&mut self) -> io::Result<()> {
        self.request.flush().await?;
        self.response.flush().await
    }
}

async fn create_file(path: PathBuf) -> ProxyResult<File> {
    File::create(&path).await.map_err(|source| ProxyError::LogCreate {
        path: path.display().to_string(),
        source,
    })
}
