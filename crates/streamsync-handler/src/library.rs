use async_trait::async_trait;
use std::path::{Path, PathBuf};
use streamsync_core::hooks::AssetLibrary;
use streamsync_core::models::Asset;
use streamsync_core::{SyncError, SyncResult};
use uuid::Uuid;

/// Video files in a local directory, exposed as host assets
///
/// Asset ids are UUID v5 values derived from the canonical file path, so the
/// same file maps to the same asset on every run.
#[derive(Debug, Clone)]
pub struct LocalAssetLibrary {
    root: PathBuf,
}

impl LocalAssetLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Describe a single file as an asset
    pub async fn asset_for(path: &Path) -> SyncResult<Asset> {
        let canonical = tokio::fs::canonicalize(path).await?;
        let metadata = tokio::fs::metadata(&canonical).await?;
        if !metadata.is_file() {
            return Err(SyncError::InvalidInput(format!(
                "{} is not a regular file",
                canonical.display()
            )));
        }

        let filename = canonical
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        let title = canonical
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Asset {
            id: Uuid::new_v5(
                &Uuid::NAMESPACE_URL,
                canonical.to_string_lossy().as_bytes(),
            ),
            title,
            content_type: content_type_for(&canonical).to_string(),
            filename,
            file_size: metadata.len(),
            path: canonical,
        })
    }
}

#[async_trait]
impl AssetLibrary for LocalAssetLibrary {
    async fn find_all_videos(&self) -> SyncResult<Vec<Asset>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut assets = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }

            let asset = Self::asset_for(&entry.path()).await?;
            if asset.is_video() {
                assets.push(asset);
            } else {
                tracing::debug!(filename = %asset.filename, "Skipping non-video file");
            }
        }

        assets.sort_by(|a, b| a.filename.cmp(&b.filename));
        tracing::debug!(
            root = %self.root.display(),
            count = assets.len(),
            "Video assets discovered"
        );
        Ok(assets)
    }
}

/// Content type inferred from the file extension
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "m4v" => "video/x-m4v",
        "mpg" | "mpeg" => "video/mpeg",
        "ogv" => "video/ogg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a.MOV")), "video/quicktime");
        assert_eq!(content_type_for(Path::new("a.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn finds_only_video_files_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.mp4"), b"bbbb").unwrap();
        fs::write(dir.path().join("a.mov"), b"aa").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip").unwrap();
        fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let library = LocalAssetLibrary::new(dir.path());
        let assets = library.find_all_videos().await.unwrap();

        let names: Vec<&str> = assets.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a.mov", "b.mp4"]);
        assert_eq!(assets[0].content_type, "video/quicktime");
        assert_eq!(assets[0].title, "a");
        assert_eq!(assets[1].file_size, 4);
    }

    #[tokio::test]
    async fn asset_ids_are_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, b"data").unwrap();

        let first = LocalAssetLibrary::asset_for(&path).await.unwrap();
        let second = LocalAssetLibrary::asset_for(&path).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id.get_version_num(), 5);
    }

    #[tokio::test]
    async fn missing_directory_is_io_error() {
        let library = LocalAssetLibrary::new("/nonexistent/streamsync");
        let err = library.find_all_videos().await.unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
