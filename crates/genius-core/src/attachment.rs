use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

/// At most this many images per submission.
pub const MAX_ATTACHMENTS: usize = 5;

/// Per-file size ceiling, checked before encoding.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// An inline image payload attached to a single pending submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub mime_type: String,
    /// Base64 payload, no data-URL prefix.
    pub data: String,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }
}

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("maximum {MAX_ATTACHMENTS} images allowed, got {0}")]
    LimitExceeded(usize),

    #[error("file {name} exceeds the 5 MiB limit")]
    TooLarge { name: String },

    #[error("file {name} is not an image")]
    UnsupportedType { name: String },

    #[error("failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AttachmentError>;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Encode a batch of image files into [`Attachment`]s.
///
/// The whole batch is validated up front, in submission order, so a
/// violation rejects the submission atomically and names the first
/// offending file. Only then are the payloads read, concurrently; the
/// returned sequence is still in submission order.
pub async fn encode_image_files(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    if paths.len() > MAX_ATTACHMENTS {
        return Err(AttachmentError::LimitExceeded(paths.len()));
    }

    let mut mime_types = Vec::with_capacity(paths.len());
    for path in paths {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            return Err(AttachmentError::UnsupportedType {
                name: display_name(path),
            });
        }

        let metadata = fs::metadata(path).await.map_err(|source| AttachmentError::Io {
            name: display_name(path),
            source,
        })?;
        if metadata.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                name: display_name(path),
            });
        }

        mime_types.push(mime.essence_str().to_string());
    }

    let reads = paths.iter().map(|path| async move {
        fs::read(path).await.map_err(|source| AttachmentError::Io {
            name: display_name(path),
            source,
        })
    });
    let payloads = try_join_all(reads).await?;

    Ok(mime_types
        .into_iter()
        .zip(payloads)
        .map(|(mime_type, bytes)| Attachment::from_bytes(mime_type, &bytes))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn empty_selection_yields_no_attachments() {
        let attachments = encode_image_files(&[]).await.unwrap();
        assert!(attachments.is_empty());
    }

    #[tokio::test]
    async fn encodes_in_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = touch(dir.path(), "a.png", b"png-bytes");
        let second = touch(dir.path(), "b.jpg", b"jpg-bytes");

        let attachments = encode_image_files(&[first, second]).await.unwrap();

        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].mime_type, "image/png");
        assert_eq!(attachments[1].mime_type, "image/jpeg");
        assert_eq!(
            BASE64_STANDARD.decode(&attachments[0].data).unwrap(),
            b"png-bytes"
        );
        assert_eq!(
            BASE64_STANDARD.decode(&attachments[1].data).unwrap(),
            b"jpg-bytes"
        );
    }

    #[tokio::test]
    async fn six_images_reject_the_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6)
            .map(|i| touch(dir.path(), &format!("{i}.png"), b"x"))
            .collect();

        let err = encode_image_files(&paths).await.unwrap_err();
        assert!(matches!(err, AttachmentError::LimitExceeded(6)));
    }

    #[tokio::test]
    async fn oversized_file_names_the_first_offender() {
        let dir = tempfile::tempdir().unwrap();
        let ok = touch(dir.path(), "small.png", b"x");

        // A sparse file is enough; validation reads metadata, not contents.
        let big = dir.path().join("big.png");
        File::create(&big)
            .unwrap()
            .set_len(MAX_ATTACHMENT_BYTES + 1)
            .unwrap();
        let bigger = dir.path().join("bigger.png");
        File::create(&bigger)
            .unwrap()
            .set_len(MAX_ATTACHMENT_BYTES + 2)
            .unwrap();

        let err = encode_image_files(&[ok, big, bigger]).await.unwrap_err();
        match err {
            AttachmentError::TooLarge { name } => assert_eq!(name, "big.png"),
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_image_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), "notes.txt", b"text");

        let err = encode_image_files(&[path]).await.unwrap_err();
        match err {
            AttachmentError::UnsupportedType { name } => assert_eq!(name, "notes.txt"),
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_surfaces_io_error() {
        let err = encode_image_files(&[PathBuf::from("/no/such/file.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, AttachmentError::Io { .. }));
    }
}
