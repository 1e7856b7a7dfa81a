use crate::config::MediaConfig;
use crate::error::app_error::AppError;
use chrono::Utc;
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STAGING_DIR: &str = ".staging";
const FILE_PREFIX: &str = "part";

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A validated image sitting in the staging area, not yet publicly served.
#[derive(Debug)]
#[must_use = "a staged image must be promoted or discarded"]
pub struct StagedImage {
    file_name: String,
    staged_path: PathBuf,
    public_path: String,
}

impl StagedImage {
    /// Path the image will be reachable at once promoted.
    pub fn public_path(&self) -> &str {
        &self.public_path
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    staging: PathBuf,
    url_prefix: String,
    max_upload_bytes: u64,
}

fn image_subtype(content_type: Option<&str>) -> Option<String> {
    let essence = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = essence.strip_prefix("image/")?;
    (!subtype.is_empty()).then(|| subtype.to_string())
}

fn extension_for(subtype: &str) -> String {
    match subtype {
        "jpeg" | "jpg" | "pjpeg" => "jpg".to_string(),
        "svg+xml" => "svg".to_string(),
        other => {
            let cleaned: String = other.chars().filter(char::is_ascii_alphanumeric).take(10).collect();
            if cleaned.is_empty() { "img".to_string() } else { cleaned }
        }
    }
}

fn generate_file_name(extension: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: [u8; 4] = rng.r#gen();
    format!("{}_{}_{}.{}", FILE_PREFIX, Utc::now().timestamp_millis(), hex::encode(suffix), extension)
}

impl MediaStore {
    /// Prepares the media root and makes sure it accepts writes.
    pub async fn open(config: &MediaConfig) -> Result<Self, AppError> {
        let root = PathBuf::from(&config.root);
        let staging = root.join(STAGING_DIR);

        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| AppError::media(format!("Failed to create media directory {}", root.display()), e))?;

        let write_test = staging.join(".write-test");
        tokio::fs::write(&write_test, b"ok")
            .await
            .map_err(|e| AppError::media(format!("Media directory {} is not writable", root.display()), e))?;
        tokio::fs::remove_file(&write_test)
            .await
            .map_err(|e| AppError::media("Failed to clean up media write test", e))?;

        info!(root = %root.display(), "media storage ready");

        Ok(Self {
            root,
            staging,
            url_prefix: config.public_prefix(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rejects anything that is not an image or exceeds the size limit.
    /// Returns the file extension the image will be stored with.
    pub fn validate(&self, upload: &ImageUpload) -> Result<String, AppError> {
        let subtype = image_subtype(upload.content_type.as_deref()).ok_or_else(|| AppError::InvalidUpload("Only image files are allowed".to_string()))?;

        if upload.bytes.is_empty() {
            return Err(AppError::InvalidUpload("Uploaded file is empty".to_string()));
        }
        if upload.bytes.len() as u64 > self.max_upload_bytes {
            return Err(AppError::InvalidUpload(format!("Image exceeds the {} byte limit", self.max_upload_bytes)));
        }

        Ok(extension_for(&subtype))
    }

    pub async fn stage(&self, upload: ImageUpload) -> Result<StagedImage, AppError> {
        let extension = self.validate(&upload)?;
        let file_name = generate_file_name(&extension);
        let staged_path = self.staging.join(&file_name);

        tokio::fs::write(&staged_path, &upload.bytes)
            .await
            .map_err(|e| AppError::media("Failed to store uploaded image", e))?;

        debug!(file = %file_name, bytes = upload.bytes.len(), "image staged");

        Ok(StagedImage {
            public_path: format!("{}/{}", self.url_prefix, file_name),
            file_name,
            staged_path,
        })
    }

    /// Moves a staged image into the served directory and returns its public path.
    /// A staged file that cannot be moved is deleted before the error is returned.
    pub async fn promote(&self, staged: StagedImage) -> Result<String, AppError> {
        let target = self.root.join(&staged.file_name);
        if let Err(e) = tokio::fs::rename(&staged.staged_path, &target).await {
            self.discard(staged).await;
            return Err(AppError::media("Failed to publish uploaded image", e));
        }

        debug!(file = %staged.file_name, "image promoted");
        Ok(staged.public_path)
    }

    pub async fn discard(&self, staged: StagedImage) {
        if let Err(e) = tokio::fs::remove_file(&staged.staged_path).await {
            warn!(file = %staged.file_name, error = %e, "failed to discard staged image");
        }
    }

    /// Resolves a public path to a file directly inside the root.
    /// Anything outside the prefix, nested, or hidden resolves to nothing.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let rest = public_path.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        let name = Path::new(rest).file_name()?.to_str()?;
        if name != rest || name.starts_with('.') {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Best-effort removal of a previously promoted image.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            warn!(path = %public_path, "refusing to remove media outside the media root");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %public_path, "image removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => debug!(path = %public_path, "image already gone"),
            Err(e) => warn!(path = %public_path, error = %e, "failed to remove image"),
        }
    }
}
