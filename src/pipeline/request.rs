//! Conversion requests against the remote label service.
//!
//! One file, one `POST`. The file bytes are the raw request body, the
//! parameters travel as JSON in the `params` query argument, and the ZPL
//! comes back as plain text.
//!
//! ## Failure classes
//!
//! Every failure is mapped to exactly one [`ConversionError`] variant:
//!
//! | Situation | Variant |
//! |-----------|---------|
//! | server answered non-2xx | [`ConversionError::Remote`] (status + body) |
//! | no response: timeout, refused, reset | [`ConversionError::Connectivity`] |
//! | request never sent, or response unusable | [`ConversionError::Internal`] |
//!
//! There is no retry; the caller decides what to do with a failure.

use crate::config::ClientConfig;
use crate::error::{ConversionError, LabelZplError};
use crate::output::ConversionOutcome;
use crate::params::ConversionParameters;
use crate::pipeline::input::{extension_of, UploadCandidate};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Confirmation reported after a successful ZPL → PDF render.
pub const PDF_GENERATED_MESSAGE: &str = "PDF generated successfully";

/// Input document type, which selects the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Png,
}

impl SourceKind {
    /// Pick the kind from a file name's extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match extension_of(name)?.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "png" => Some(SourceKind::Png),
            _ => None,
        }
    }

    /// MIME type sent as the request `Content-Type`.
    pub fn content_type(self) -> &'static str {
        match self {
            SourceKind::Pdf => "application/pdf",
            SourceKind::Png => "image/png",
        }
    }

    pub fn endpoint(self) -> Endpoint {
        match self {
            SourceKind::Pdf => Endpoint::PdfToZpl,
            SourceKind::Png => Endpoint::PngToZpl,
        }
    }
}

/// The three conversion operations the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    PdfToZpl,
    PngToZpl,
    ZplToPdf,
}

impl Endpoint {
    /// Path below the configured base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::PdfToZpl => "/convert/pdf/to/zpl",
            Endpoint::PngToZpl => "/convert/png/to/zpl",
            Endpoint::ZplToPdf => "/convert/zpl/to/pdf",
        }
    }

    /// Value of the `Accept` header.
    pub fn accept(self) -> &'static str {
        match self {
            Endpoint::PdfToZpl | Endpoint::PngToZpl => "text/plain",
            Endpoint::ZplToPdf => "application/pdf",
        }
    }
}

/// Anything that can turn label documents into ZPL.
///
/// [`ConversionClient`] is the HTTP implementation. The batch orchestrator
/// and the session only depend on this trait, so tests and alternative
/// backends can plug in their own.
#[async_trait]
pub trait LabelConverter: Send + Sync {
    /// Convert a PDF or PNG payload to ZPL text.
    async fn convert_to_zpl(
        &self,
        kind: SourceKind,
        payload: Vec<u8>,
        params: Option<&ConversionParameters>,
    ) -> Result<String, ConversionError>;

    /// Render ZPL text back to a PDF.
    ///
    /// The PDF itself is discarded; success yields [`PDF_GENERATED_MESSAGE`].
    async fn render_zpl_to_pdf(
        &self,
        zpl: &str,
        params: Option<&ConversionParameters>,
    ) -> Result<String, ConversionError>;

    /// Convert one upload candidate into a [`ConversionOutcome`].
    ///
    /// A payload that cannot be read counts as a local failure: the request
    /// was never sent.
    async fn convert_file(
        &self,
        candidate: &UploadCandidate,
        kind: SourceKind,
        params: Option<&ConversionParameters>,
    ) -> ConversionOutcome {
        let result = match candidate.read().await {
            Ok(payload) => self.convert_to_zpl(kind, payload, params).await,
            Err(e) => Err(ConversionError::Internal {
                detail: format!("failed to read '{}': {e}", candidate.name()),
            }),
        };
        ConversionOutcome::from_result(candidate.name(), result)
    }
}

/// HTTP client for the conversion service.
#[derive(Debug, Clone)]
pub struct ConversionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ConversionClient {
    /// Build the underlying HTTP client with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, LabelZplError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LabelZplError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of an endpoint, without query string.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.config.base_url, endpoint.path())
    }

    /// Send one request and return the successful response.
    async fn post(
        &self,
        endpoint: Endpoint,
        content_type: &str,
        body: Vec<u8>,
        params: Option<&ConversionParameters>,
    ) -> Result<reqwest::Response, ConversionError> {
        let url = self.endpoint_url(endpoint);
        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, endpoint.accept())
            .bearer_auth(&self.config.api_key);

        if let Some(params) = params {
            let json = params.to_json().map_err(|e| ConversionError::Internal {
                detail: format!("failed to serialise params: {e}"),
            })?;
            request = request.query(&[("params", json)]);
        }

        debug!("POST {} ({} bytes, {})", url, body.len(), content_type);
        let response = request
            .body(body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned {}: {}", url, status, body);
            return Err(ConversionError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LabelConverter for ConversionClient {
    async fn convert_to_zpl(
        &self,
        kind: SourceKind,
        payload: Vec<u8>,
        params: Option<&ConversionParameters>,
    ) -> Result<String, ConversionError> {
        let response = self
            .post(kind.endpoint(), kind.content_type(), payload, params)
            .await?;
        let zpl = response.text().await.map_err(classify_transport_error)?;
        debug!("Received {} chars of ZPL", zpl.len());
        Ok(zpl)
    }

    async fn render_zpl_to_pdf(
        &self,
        zpl: &str,
        params: Option<&ConversionParameters>,
    ) -> Result<String, ConversionError> {
        let response = self
            .post(
                Endpoint::ZplToPdf,
                "text/plain",
                zpl.as_bytes().to_vec(),
                params,
            )
            .await?;
        let pdf = response.bytes().await.map_err(classify_transport_error)?;
        debug!("Received {} bytes of PDF", pdf.len());
        Ok(PDF_GENERATED_MESSAGE.to_string())
    }
}

/// Map a reqwest error to the connectivity or internal class.
///
/// Non-2xx statuses never reach here: they are handled as
/// [`ConversionError::Remote`] before the body is read.
fn classify_transport_error(e: reqwest::Error) -> ConversionError {
    let detail = e.to_string();
    if e.is_builder() || e.is_decode() {
        ConversionError::Internal { detail }
    } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        ConversionError::Connectivity { detail }
    } else {
        ConversionError::Internal { detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ConversionClient {
        ConversionClient::new(
            ClientConfig::builder()
                .api_key("k")
                .base_url(base)
                .build()
                .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn source_kind_from_extension() {
        assert_eq!(SourceKind::from_file_name("a.pdf"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_file_name("A.PNG"), Some(SourceKind::Png));
        assert_eq!(SourceKind::from_file_name("a.jpg"), None);
        assert_eq!(SourceKind::from_file_name("pdf"), None);
    }

    #[test]
    fn content_types_and_endpoints() {
        assert_eq!(SourceKind::Pdf.content_type(), "application/pdf");
        assert_eq!(SourceKind::Png.content_type(), "image/png");
        assert_eq!(SourceKind::Png.endpoint(), Endpoint::PngToZpl);
        assert_eq!(Endpoint::ZplToPdf.accept(), "application/pdf");
        assert_eq!(Endpoint::PdfToZpl.accept(), "text/plain");
    }

    #[test]
    fn endpoint_url_joins_base() {
        let c = client("https://labels.example.com/api/");
        assert_eq!(
            c.endpoint_url(Endpoint::PdfToZpl),
            "https://labels.example.com/api/convert/pdf/to/zpl"
        );
        assert_eq!(
            c.endpoint_url(Endpoint::ZplToPdf),
            "https://labels.example.com/api/convert/zpl/to/pdf"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_connectivity() {
        // Port 9 (discard) on localhost is closed in test environments.
        let c = client("http://127.0.0.1:9/api");
        let err = c
            .convert_to_zpl(SourceKind::Pdf, b"%PDF".to_vec(), None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ConversionError::Connectivity { .. }),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn unreadable_payload_is_internal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let candidate = UploadCandidate::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let outcome = client("http://127.0.0.1:9/api")
            .convert_file(&candidate, SourceKind::Pdf, None)
            .await;
        assert!(!outcome.is_success());
        assert!(matches!(
            outcome.error(),
            Some(ConversionError::Internal { .. })
        ));
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("Internal error. Please try again.")
        );
    }
}
