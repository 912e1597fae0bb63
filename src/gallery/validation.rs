use thiserror::Error;

use crate::constants::{MAX_FILES_PER_UPLOAD, MAX_IMAGE_SIZE, MAX_VIDEO_SIZE};
use crate::models::{IncomingFile, ResourceType, UploadMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No files were provided")]
    NoFiles,

    #[error("At most {max} files can be uploaded at once")]
    TooManyFiles { max: usize },

    #[error(
        "Unsupported file type: {file_name}. Only images (JPG, JPEG, PNG, WEBP) and videos (MP4, MOV, AVI, WEBM) are supported."
    )]
    UnsupportedType { file_name: String },

    #[error("File too large: {file_name} (max {max_mb}MB)")]
    FileTooLarge { file_name: String, max_mb: usize },

    #[error("Name is required")]
    MissingName,

    #[error(
        "Upload too large: at most {} files, images up to {}MB and videos up to {}MB",
        MAX_FILES_PER_UPLOAD,
        MAX_IMAGE_SIZE / (1024 * 1024),
        MAX_VIDEO_SIZE / (1024 * 1024)
    )]
    RequestTooLarge,
}

/// Checks the whole batch before anything is uploaded and returns each
/// file's resource type, in input order.
pub fn validate_batch(
    files: &[IncomingFile],
    metadata: &UploadMetadata,
) -> Result<Vec<ResourceType>, ValidationError> {
    if files.is_empty() {
        return Err(ValidationError::NoFiles);
    }

    if files.len() > MAX_FILES_PER_UPLOAD {
        return Err(ValidationError::TooManyFiles {
            max: MAX_FILES_PER_UPLOAD,
        });
    }

    let mut resource_types = Vec::with_capacity(files.len());
    for file in files {
        let resource_type = ResourceType::from_content_type(&file.content_type).ok_or_else(|| {
            ValidationError::UnsupportedType {
                file_name: file.file_name.clone(),
            }
        })?;

        let max_size = resource_type.max_size();
        if file.size() > max_size {
            return Err(ValidationError::FileTooLarge {
                file_name: file.file_name.clone(),
                max_mb: max_size / (1024 * 1024),
            });
        }

        resource_types.push(resource_type);
    }

    if metadata.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }

    Ok(resource_types)
}
