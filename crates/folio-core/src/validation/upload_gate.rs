//! Size and type gate applied before a file is handed to the upload pipeline.
//!
//! The pipeline itself accepts any bytes; callers must run [`UploadGate::check`]
//! first so that rejected files never reach the transfer step.

use crate::models::MediaCategory;

fn as_mb(bytes: &u64) -> String {
    let mb = *bytes as f64 / (1024.0 * 1024.0);
    if mb.fract() == 0.0 {
        format!("{}", mb as u64)
    } else {
        format!("{:.1}", mb)
    }
}

/// Why the gate refused a file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("File is empty")]
    EmptyFile,

    #[error("File size exceeds {}MB limit", as_mb(.max))]
    FileTooLarge { size: u64, max: u64 },

    #[error("File type '{content_type}' is not accepted (accepted: {accept})")]
    NotAccepted { content_type: String, accept: String },

    #[error("Accept pattern '{0}' is not allowed")]
    AcceptNotAllowed(String),
}

/// Lowercased, trimmed, non-empty patterns of a comma-separated accept string.
fn accept_patterns(accept: &str) -> impl Iterator<Item = String> + '_ {
    accept
        .split(',')
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
}

#[derive(Debug, Clone)]
pub struct UploadGate {
    max_size_bytes: u64,
    accept: String,
}

impl UploadGate {
    pub fn new(max_size_bytes: u64, accept: impl Into<String>) -> Self {
        Self {
            max_size_bytes,
            accept: accept.into(),
        }
    }

    /// Gate for a request that may name its own accept pattern.
    ///
    /// Without one the configured default applies. A requested pattern may only use
    /// entries from `allowed` or from the default itself, so a caller can narrow the
    /// gate but never widen it.
    pub fn for_request(
        max_size_bytes: u64,
        default_accept: &str,
        allowed: &[String],
        requested: Option<&str>,
    ) -> Result<Self, GateError> {
        let Some(requested) = requested else {
            return Ok(Self::new(max_size_bytes, default_accept));
        };

        let permitted: Vec<String> = allowed
            .iter()
            .flat_map(|a| accept_patterns(a))
            .chain(accept_patterns(default_accept))
            .collect();

        let mut patterns = accept_patterns(requested).peekable();
        if patterns.peek().is_none() || !patterns.all(|p| permitted.contains(&p)) {
            return Err(GateError::AcceptNotAllowed(requested.to_string()));
        }

        Ok(Self::new(max_size_bytes, requested))
    }

    /// Folder category implied by the accept pattern.
    pub fn category(&self) -> MediaCategory {
        MediaCategory::from_accept(&self.accept)
    }

    /// Check a file against the gate, returning the category to upload it under.
    pub fn check(
        &self,
        filename: &str,
        content_type: &str,
        size: u64,
    ) -> Result<MediaCategory, GateError> {
        if size == 0 {
            return Err(GateError::EmptyFile);
        }
        if size > self.max_size_bytes {
            return Err(GateError::FileTooLarge {
                size,
                max: self.max_size_bytes,
            });
        }
        if !self.accepts(filename, content_type) {
            return Err(GateError::NotAccepted {
                content_type: content_type.to_string(),
                accept: self.accept.clone(),
            });
        }
        Ok(self.category())
    }

    fn accepts(&self, filename: &str, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        let filename = filename.to_ascii_lowercase();

        let mut patterns = accept_patterns(&self.accept).peekable();

        if patterns.peek().is_none() {
            return true;
        }

        patterns.any(|pattern| {
            if pattern == "*" || pattern == "*/*" {
                true
            } else if let Some(ext) = pattern.strip_prefix('.') {
                filename.ends_with(&format!(".{}", ext))
            } else if let Some(major) = pattern.strip_suffix("/*") {
                essence
                    .split_once('/')
                    .is_some_and(|(m, _)| m == major)
            } else {
                essence == pattern
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MB: u64 = 5 * 1024 * 1024;

    #[test]
    fn accepts_image_within_limit() {
        let gate = UploadGate::new(FIVE_MB, "image/*");
        assert_eq!(
            gate.check("cat.png", "image/png", 1024),
            Ok(MediaCategory::Image)
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let gate = UploadGate::new(FIVE_MB, "image/*");
        let err = gate.check("big.png", "image/png", FIVE_MB + 1).unwrap_err();
        assert_eq!(
            err,
            GateError::FileTooLarge {
                size: FIVE_MB + 1,
                max: FIVE_MB
            }
        );
        assert_eq!(err.to_string(), "File size exceeds 5MB limit");
    }

    #[test]
    fn rejects_wrong_type() {
        let gate = UploadGate::new(FIVE_MB, "image/*");
        assert!(matches!(
            gate.check("clip.mp4", "video/mp4", 10),
            Err(GateError::NotAccepted { .. })
        ));
    }

    #[test]
    fn rejects_empty_file() {
        let gate = UploadGate::new(FIVE_MB, "*/*");
        assert_eq!(gate.check("a.txt", "text/plain", 0), Err(GateError::EmptyFile));
    }

    #[test]
    fn extension_and_exact_patterns() {
        let gate = UploadGate::new(FIVE_MB, "application/pdf, .docx");
        assert_eq!(
            gate.check("cv.pdf", "application/pdf", 10),
            Ok(MediaCategory::Other)
        );
        assert_eq!(
            gate.check("CV.DOCX", "application/octet-stream", 10),
            Ok(MediaCategory::Other)
        );
        assert!(gate.check("cv.txt", "text/plain", 10).is_err());
    }

    #[test]
    fn video_gate_uses_video_folder() {
        let gate = UploadGate::new(FIVE_MB, "video/*");
        assert_eq!(
            gate.check("clip.webm", "video/webm", 10).map(|c| c.folder()),
            Ok("videos")
        );
    }

    fn allowed() -> Vec<String> {
        vec!["image/*".to_string(), "video/*".to_string(), ".pdf".to_string()]
    }

    #[test]
    fn request_without_accept_uses_default() {
        let gate = UploadGate::for_request(FIVE_MB, "image/*", &allowed(), None).unwrap();
        assert!(gate.check("a.png", "image/png", 10).is_ok());
        assert!(gate.check("a.pdf", "application/pdf", 10).is_err());
    }

    #[test]
    fn request_may_pick_allowed_patterns() {
        let gate =
            UploadGate::for_request(FIVE_MB, "image/*", &allowed(), Some(" .PDF , image/*")).unwrap();
        assert_eq!(
            gate.check("cv.pdf", "application/pdf", 10),
            Ok(MediaCategory::Image)
        );
    }

    #[test]
    fn request_cannot_widen_the_gate() {
        for requested in ["text/html", "*/*", "*", "image/*,text/html", ",", " "] {
            assert_eq!(
                UploadGate::for_request(FIVE_MB, "image/*", &allowed(), Some(requested))
                    .unwrap_err(),
                GateError::AcceptNotAllowed(requested.to_string()),
                "{}",
                requested
            );
        }
    }
}
