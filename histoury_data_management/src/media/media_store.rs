use std::path::{Path, PathBuf};

use crate::DataManagerError;

const UPLOADS_DIR: &str = "uploads";
const AUDIO_DIR: &str = "audio";
const PHOTOS_DIR: &str = "photos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Scanned images sent for landmark recognition.
    Upload,
    /// Narration and guide answers.
    Audio,
    /// Images attached to journeys.
    Photo,
}

impl MediaKind {
    fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Upload => UPLOADS_DIR,
            MediaKind::Audio => AUDIO_DIR,
            MediaKind::Photo => PHOTOS_DIR,
        }
    }
}

/// Files on disk, one directory per [`MediaKind`].
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub async fn start(root: PathBuf) -> Result<Self, DataManagerError> {
        for kind in [MediaKind::Upload, MediaKind::Audio, MediaKind::Photo] {
            let dir = root.join(kind.dir_name());
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await
                    .map_err(|_| DataManagerError::Media(format!("Failed to create media directory: {:?}", dir)))?;
            }
        }

        Ok(MediaStore { root })
    }

    pub fn path(&self, kind: MediaKind, file_name: &str) -> Result<PathBuf, DataManagerError> {
        let file_name = sanitize_file_name(file_name)
            .ok_or(DataManagerError::Media(format!("Illegal file name: {:?}", file_name)))?;
        Ok(self.root.join(kind.dir_name()).join(file_name))
    }

    /// Writes `bytes`, replacing any file of the same name. Returns the stored file name.
    pub async fn write(&self, kind: MediaKind, file_name: &str, bytes: &[u8]) -> Result<String, DataManagerError> {
        let path = self.path(kind, file_name)?;
        tokio::fs::write(&path, bytes).await
            .map_err(|_| DataManagerError::Media(format!("Failed to write media file: {:?}", path)))?;

        tracing::debug!("Stored {} bytes at {:?}", bytes.len(), path);

        Ok(file_name_of(&path))
    }

    pub async fn read(&self, kind: MediaKind, file_name: &str) -> Result<Vec<u8>, DataManagerError> {
        let path = self.path(kind, file_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(DataManagerError::NotFound(format!("No such file: {}", file_name_of(&path))))
            }
            Err(_) => Err(DataManagerError::Media(format!("Failed to read media file: {:?}", path))),
        }
    }

    /// Missing files are not an error.
    pub async fn remove(&self, kind: MediaKind, file_name: &str) -> Result<(), DataManagerError> {
        let path = self.path(kind, file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(DataManagerError::Media(format!("Failed to remove media file: {:?}", path))),
        }
    }
}

/// Keeps only the final path component and refuses names that could escape the media directory.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." || last.contains('\0') {
        return None;
    }
    Some(last.to_string())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
