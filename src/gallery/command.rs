/*
 * Responsibility
 * - dispatcher に渡すリクエストの closed set (ImageCommand) と結果 (ImageOutcome)
 * - handler 実行前の validation (fail fast, 副作用なし)
 */
use std::fmt;

use uuid::Uuid;

use crate::gallery::error::GalleryError;
use crate::repos::ImageRecord;

pub const TITLE_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    List,
    Get,
    Download,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    // Operations aimed at an existing image go through the ownership guard.
    pub fn targets_existing(self) -> bool {
        !matches!(self, Self::List | Self::Create)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Download => "download",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for the gallery. Owner ids are never part of a command;
/// they always come from the resolved principal.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageCommand {
    List,
    Get { id: Uuid },
    Download { id: Uuid },
    Create { title: String, bytes: Vec<u8> },
    Update { id: Uuid, title: String },
    Delete { id: Uuid },
}

impl ImageCommand {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::List => OperationKind::List,
            Self::Get { .. } => OperationKind::Get,
            Self::Download { .. } => OperationKind::Download,
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn target(&self) -> Option<Uuid> {
        match self {
            Self::Get { id } | Self::Download { id } | Self::Update { id, .. } | Self::Delete { id } => {
                Some(*id)
            }
            Self::List | Self::Create { .. } => None,
        }
    }

    pub fn validate(&self, max_image_bytes: usize) -> Result<(), GalleryError> {
        match self {
            Self::Create { title, bytes } => {
                validate_title(title)?;
                if bytes.is_empty() {
                    return Err(GalleryError::validation("image bytes are required"));
                }
                if bytes.len() > max_image_bytes {
                    return Err(GalleryError::validation(format!(
                        "image is {} bytes, the limit is {max_image_bytes} bytes",
                        bytes.len()
                    )));
                }
                Ok(())
            }
            Self::Update { title, .. } => validate_title(title),
            Self::List | Self::Get { .. } | Self::Download { .. } | Self::Delete { .. } => Ok(()),
        }
    }
}

// Payload bytes stay out of logs.
impl fmt::Debug for ImageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { title, bytes } => f
                .debug_struct("Create")
                .field("title", title)
                .field("bytes", &bytes.len())
                .finish(),
            Self::List => f.write_str("List"),
            Self::Get { id } => f.debug_struct("Get").field("id", id).finish(),
            Self::Download { id } => f.debug_struct("Download").field("id", id).finish(),
            Self::Update { id, title } => f
                .debug_struct("Update")
                .field("id", id)
                .field("title", title)
                .finish(),
            Self::Delete { id } => f.debug_struct("Delete").field("id", id).finish(),
        }
    }
}

fn validate_title(title: &str) -> Result<(), GalleryError> {
    if title.trim().is_empty() {
        return Err(GalleryError::validation("title is required"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(GalleryError::validation(format!(
            "title must be <= {TITLE_MAX_CHARS} chars"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOutcome {
    Listed(Vec<ImageRecord>),
    Found(ImageRecord),
    Content { image: ImageRecord, bytes: Vec<u8> },
    Created(Uuid),
    Updated,
    Deleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_list_and_create_skip_the_guard() {
        assert!(!OperationKind::List.targets_existing());
        assert!(!OperationKind::Create.targets_existing());
        for kind in [
            OperationKind::Get,
            OperationKind::Download,
            OperationKind::Update,
            OperationKind::Delete,
        ] {
            assert!(kind.targets_existing(), "{kind} should be guarded");
        }
    }

    #[test]
    fn title_limit_counts_chars_not_bytes() {
        let id = Uuid::new_v4();
        let exactly = "é".repeat(TITLE_MAX_CHARS);
        assert!(ImageCommand::Update { id, title: exactly }.validate(10).is_ok());

        let over = "a".repeat(TITLE_MAX_CHARS + 1);
        assert!(matches!(
            ImageCommand::Update { id, title: over }.validate(10),
            Err(GalleryError::ValidationFailed(_))
        ));
    }

    #[test]
    fn create_requires_title_and_bytes_within_limit() {
        let create = |title: &str, bytes: &[u8]| ImageCommand::Create {
            title: title.to_string(),
            bytes: bytes.to_vec(),
        };

        assert!(create("ok", b"abc").validate(3).is_ok());
        assert!(create(" ", b"abc").validate(3).is_err());
        assert!(create("ok", b"").validate(3).is_err());
        assert!(create("ok", b"abcd").validate(3).is_err());
    }

    #[test]
    fn debug_hides_payload() {
        let cmd = ImageCommand::Create {
            title: "t".to_string(),
            bytes: vec![0xff; 3],
        };
        assert_eq!(format!("{cmd:?}"), r#"Create { title: "t", bytes: 3 }"#);
    }
}
