use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::services::artifact_store::ArtifactStore;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const TOO_LARGE: &str = "file too large";
pub const INVALID_TYPE: &str = "invalid file type";
pub const EMPTY_FILE: &str = "file is empty";

/// Accepted resume media types and the extension used when the original
/// filename carries none.
const ALLOWED_MEDIA_TYPES: [(&str, &str); 3] = [
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

/// Reference to a stored resume, copied verbatim onto the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRef {
    pub url: String,
    pub artifact_id: Option<String>,
}

#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn ArtifactStore>,
}

impl ResumeService {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Checks size and media type, then stores the file under a
    /// collision-resistant name.
    ///
    /// Nothing ties the stored artifact to an application. If the caller's
    /// later submit fails, the artifact stays behind unreferenced.
    pub async fn upload(
        &self,
        applicant_id: &str,
        original_filename: &str,
        media_type: &str,
        bytes: Bytes,
    ) -> Result<ResumeRef> {
        let size = bytes.len();
        check_resume(media_type, size)?;

        let name = storage_name(applicant_id, original_filename, media_type, Utc::now());
        let stored = self
            .store
            .store(bytes, media_type, &name)
            .await
            .map_err(|e| {
                tracing::error!("Resume upload failed for {}: {}", name, e);
                Error::upload(e.to_string(), Some(media_type), Some(size))
            })?;

        tracing::info!("Stored resume {} for applicant {}", stored.artifact_id, applicant_id);
        Ok(ResumeRef {
            url: stored.url,
            artifact_id: Some(stored.artifact_id),
        })
    }
}

fn normalized_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension_for(media_type: &str) -> Option<&'static str> {
    let wanted = normalized_media_type(media_type);
    ALLOWED_MEDIA_TYPES
        .iter()
        .find(|(mime, _)| *mime == wanted)
        .map(|(_, ext)| *ext)
}

/// Client-side checks that run before any call to the artifact store.
pub fn check_resume(media_type: &str, size: usize) -> Result<()> {
    if size > MAX_RESUME_BYTES {
        return Err(Error::upload(TOO_LARGE, Some(media_type), Some(size)));
    }
    if size == 0 {
        return Err(Error::upload(EMPTY_FILE, Some(media_type), Some(size)));
    }
    if extension_for(media_type).is_none() {
        return Err(Error::upload(INVALID_TYPE, Some(media_type), Some(size)));
    }
    Ok(())
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
fn sanitize(token: &str, max_len: usize) -> String {
    let cleaned: String = token
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(max_len)
        .collect();
    if cleaned.is_empty() {
        "anonymous".to_string()
    } else {
        cleaned
    }
}

/// `{applicant}_{unix millis}_{stem}.{ext}`, keeping the original extension
/// when it has one.
pub fn storage_name(
    applicant_id: &str,
    original_filename: &str,
    media_type: &str,
    at: DateTime<Utc>,
) -> String {
    let path = Path::new(original_filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("resume");
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| sanitize(&e.to_ascii_lowercase(), 8))
        .or_else(|| extension_for(media_type).map(str::to_string))
        .unwrap_or_else(|| "bin".to_string());

    format!(
        "{}_{}_{}.{}",
        sanitize(applicant_id, 64),
        at.timestamp_millis(),
        sanitize(stem, 80),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::artifact_store::{ArtifactStoreError, MockArtifactStore, StoredArtifact};
    use chrono::TimeZone;

    const PDF: &str = "application/pdf";

    #[tokio::test]
    async fn oversized_file_never_reaches_the_store() {
        let mut store = MockArtifactStore::new();
        store.expect_store().never();
        let service = ResumeService::new(Arc::new(store));

        let bytes = Bytes::from(vec![0u8; 6 * 1024 * 1024]);
        let err = service.upload("user-1", "cv.pdf", PDF, bytes).await.unwrap_err();

        match err {
            Error::Upload { message, size, .. } => {
                assert_eq!(message, TOO_LARGE);
                assert_eq!(size, Some(6 * 1024 * 1024));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unsupported_media_type_is_rejected_before_upload() {
        let mut store = MockArtifactStore::new();
        store.expect_store().never();
        let service = ResumeService::new(Arc::new(store));

        let err = service
            .upload("user-1", "cv.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload { ref message, .. } if message == INVALID_TYPE));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_its_message() {
        let mut store = MockArtifactStore::new();
        store
            .expect_store()
            .times(1)
            .returning(|_, _, _| Err(ArtifactStoreError::Provider("bucket quota exceeded".into())));
        let service = ResumeService::new(Arc::new(store));

        let err = service
            .upload("user-1", "cv.pdf", PDF, Bytes::from_static(b"%PDF"))
            .await
            .unwrap_err();
        match err {
            Error::Upload { message, media_type, .. } => {
                assert_eq!(message, "bucket quota exceeded");
                assert_eq!(media_type.as_deref(), Some(PDF));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn successful_upload_returns_store_reference() {
        let mut store = MockArtifactStore::new();
        store.expect_store().times(1).returning(|_, media_type, name| {
            assert_eq!(media_type, PDF);
            assert!(name.starts_with("user-1_"));
            assert!(name.ends_with("_cv.pdf"));
            Ok(StoredArtifact {
                url: format!("https://files.example.com/{}", name),
                artifact_id: "a-1".into(),
            })
        });
        let service = ResumeService::new(Arc::new(store));

        let resume = service
            .upload("user-1", "cv.pdf", PDF, Bytes::from_static(b"%PDF"))
            .await
            .unwrap();
        assert!(resume.url.starts_with("https://files.example.com/user-1_"));
        assert_eq!(resume.artifact_id.as_deref(), Some("a-1"));
    }

    #[test]
    fn media_type_parameters_are_ignored() {
        assert!(check_resume("application/PDF; charset=binary", 10).is_ok());
        assert!(check_resume("text/plain", 10).is_err());
    }

    #[test]
    fn exactly_five_mebibytes_is_accepted() {
        assert!(check_resume(PDF, MAX_RESUME_BYTES).is_ok());
        assert!(check_resume(PDF, MAX_RESUME_BYTES + 1).is_err());
    }

    #[test]
    fn storage_names_differ_by_applicant_and_time() {
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 1).unwrap();

        let a = storage_name("alice@example.com", "My CV.docx", "", t1);
        let b = storage_name("bob", "My CV.docx", "", t1);
        let c = storage_name("alice@example.com", "My CV.docx", "", t2);

        assert_eq!(a, format!("alice_example_com_{}_My_CV.docx", t1.timestamp_millis()));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn missing_extension_falls_back_to_media_type() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let name = storage_name("u", "resume", "application/msword", at);
        assert!(name.ends_with("_resume.doc"));
    }
}
