use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Filesystem access used by the pipeline
#[async_trait]
pub trait CaptionStore: Send + Sync {
    /// Fresh, uniquely named directory removed when the returned guard is dropped
    async fn scratch_dir(&self) -> io::Result<TempDir>;

    /// Names of the `.srt` files directly inside `dir`
    async fn srt_files(&self, dir: &Path) -> io::Result<Vec<String>>;

    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Scratch directories on the local disk
#[derive(Debug, Clone, Default)]
pub struct LocalCaptionStore {
    root: Option<PathBuf>,
}

impl LocalCaptionStore {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

#[async_trait]
impl CaptionStore for LocalCaptionStore {
    async fn scratch_dir(&self) -> io::Result<TempDir> {
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix("yt-transcript-");

            match root {
                Some(root) => {
                    fs_err::create_dir_all(&root)?;
                    builder.tempdir_in(root)
                }
                None => builder.tempdir(),
            }
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn srt_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_srt = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));

            if is_srt && entry.file_type().await?.is_file() {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    files.push(name.to_string());
                }
            }
        }

        Ok(files)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
