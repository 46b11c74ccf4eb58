//! QR code issuing.
//!
//! `QrRenderer` is the port for turning a URL into PNG bytes; the
//! `PngQrRenderer` adapter lives in labinv-infra.

use labinv_types::error::QrError;
use uuid::Uuid;

use crate::repository::QrAssignment;

/// Abstraction over QR image rendering.
pub trait QrRenderer: Send + Sync {
    /// Render `content` as a PNG image.
    fn render_png(&self, content: &str) -> Result<Vec<u8>, QrError>;
}

/// Which detail page a QR code points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrTarget {
    Chemical,
    Study,
}

impl QrTarget {
    fn path(&self) -> &'static str {
        match self {
            QrTarget::Chemical => "qr",
            QrTarget::Study => "study-qr",
        }
    }
}

/// Issues fresh QR codes: a random identifier plus its rendered image.
pub struct QrIssuer<Q: QrRenderer> {
    renderer: Q,
    base_url: String,
}

impl<Q: QrRenderer> QrIssuer<Q> {
    pub fn new(renderer: Q, base_url: &str) -> Self {
        Self {
            renderer,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Detail page URL encoded for `code`.
    pub fn url_for(&self, target: QrTarget, code: &str) -> String {
        format!("{}/{}/{code}", self.base_url, target.path())
    }

    /// Generate a new identifier and render its URL.
    pub fn issue(&self, target: QrTarget) -> Result<QrAssignment, QrError> {
        let code = Uuid::new_v4().to_string();
        let url = self.url_for(target, &code);
        let image = self.renderer.render_png(&url)?;
        tracing::debug!(?target, %url, bytes = image.len(), "issued qr code");
        Ok(QrAssignment {
            code,
            image,
            generated_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Renderer that returns the encoded text as bytes.
    #[derive(Clone, Default)]
    pub struct EchoRenderer;

    impl QrRenderer for EchoRenderer {
        fn render_png(&self, content: &str) -> Result<Vec<u8>, QrError> {
            Ok(content.as_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::EchoRenderer;
    use super::*;

    #[test]
    fn test_issue_encodes_detail_url() {
        let issuer = QrIssuer::new(EchoRenderer, "https://lab.example.org/");
        let qr = issuer.issue(QrTarget::Study).unwrap();
        let encoded = String::from_utf8(qr.image).unwrap();
        assert_eq!(encoded, format!("https://lab.example.org/study-qr/{}", qr.code));
        assert!(Uuid::parse_str(&qr.code).is_ok());
    }

    #[test]
    fn test_each_issue_is_unique() {
        let issuer = QrIssuer::new(EchoRenderer, "http://localhost:8080");
        let a = issuer.issue(QrTarget::Chemical).unwrap();
        let b = issuer.issue(QrTarget::Chemical).unwrap();
        assert_ne!(a.code, b.code);
        assert_eq!(
            issuer.url_for(QrTarget::Chemical, "abc"),
            "http://localhost:8080/qr/abc"
        );
    }
}
