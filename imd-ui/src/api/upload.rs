//! Audio file payload for `POST /recommend/audio`

use std::path::Path;

/// File extensions the picker suggests
///
/// A hint only. The backend decides what it accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["mp3", "wav", "flac"];

/// Audio file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    /// File name sent in the multipart part and shown while loading
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its final path component as name
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension, if the file name has one
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    /// Whether the extension is one the picker suggests
    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .map(|e| ACCEPTED_EXTENSIONS.contains(&e.as_str()))
            .unwrap_or(false)
    }

    /// MIME type guessed from the extension
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("mp3") => "audio/mpeg",
            Some("wav") => "audio/wav",
            Some("flac") => "audio/flac",
            _ => "application/octet-stream",
        }
    }
}
