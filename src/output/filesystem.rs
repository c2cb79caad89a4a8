use crate::output::traits::{OutputError, OutputResult, PageSink};
use async_trait::async_trait;
use std::path::Path;

/// Writes pages into the local file tree
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemSink;

impl FileSystemSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PageSink for FileSystemSink {
    /// Creates missing parent directories, then overwrites the file with the
    /// UTF-8 content
    async fn write(&self, path: &Path, content: &str) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| OutputError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(path, content.as_bytes())
            .await
            .map_err(|source| OutputError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}
