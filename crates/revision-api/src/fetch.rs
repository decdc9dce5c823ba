//! Document resolution: local paths, remote URLs and in-memory bytes.

use crate::error::EngineError;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Remote downloads are bounded; a stalled server must not hang a
/// comparison indefinitely.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const PDF_MAGIC: &[u8] = b"%PDF-";
/// DOCX is a ZIP container.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A document to operate on, wherever it lives.
#[derive(Debug, Clone)]
pub enum DocRef {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

/// Formats the engine accepts. Anything else is rejected up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Pdf,
    Docx,
}

impl DocRef {
    fn display(&self) -> String {
        match self {
            DocRef::Path(path) => path.display().to_string(),
            DocRef::Url(url) => url.clone(),
            DocRef::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

/// Lowercased extension of a path or URL, with any query/fragment stripped.
fn extension_of(name: &str) -> Option<String> {
    let name = name.split(['?', '#']).next().unwrap_or(name);
    let last_segment = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn format_from_extension(name: &str) -> Result<DocFormat, EngineError> {
    match extension_of(name).as_deref() {
        Some("pdf") => Ok(DocFormat::Pdf),
        Some("docx") => Ok(DocFormat::Docx),
        _ => Err(EngineError::UnsupportedFormat(name.to_string())),
    }
}

fn format_from_bytes(bytes: &[u8]) -> Result<DocFormat, EngineError> {
    if bytes.starts_with(PDF_MAGIC) {
        Ok(DocFormat::Pdf)
    } else if bytes.starts_with(ZIP_MAGIC) {
        Ok(DocFormat::Docx)
    } else {
        Err(EngineError::UnsupportedFormat(
            "unrecognized document bytes".to_string(),
        ))
    }
}

/// Resolve a reference to its bytes and detected format.
///
/// Paths and URLs are gated on their extension before any I/O; raw bytes
/// are sniffed by magic number. Downloads are staged through a scoped
/// temporary file so partial transfers never linger on disk.
pub async fn resolve(doc_ref: &DocRef) -> Result<(Vec<u8>, DocFormat), EngineError> {
    match doc_ref {
        DocRef::Path(path) => {
            let format = format_from_extension(&path.to_string_lossy())?;
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|_| EngineError::DocumentNotFound(path.display().to_string()))?;
            debug!(path = %path.display(), len = bytes.len(), "document read");
            Ok((bytes, format))
        }
        DocRef::Url(url) => {
            let format = format_from_extension(url)?;
            let bytes = download(url).await?;
            Ok((bytes, format))
        }
        DocRef::Bytes(bytes) => {
            let format = format_from_bytes(bytes)?;
            Ok((bytes.clone(), format))
        }
    }
}

async fn download(url: &str) -> Result<Vec<u8>, EngineError> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| EngineError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| EngineError::Download(format!("{url}: {e}")))?;
    if !response.status().is_success() {
        return Err(EngineError::Download(format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }

    // Stream into a scoped temp file; a partial transfer never yields a
    // usable buffer, and the file is removed on drop whether or not the
    // caller's transform succeeds.
    let mut staged = tempfile::NamedTempFile::new()?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| EngineError::Download(format!("{url}: {e}")))?
    {
        staged.write_all(&chunk)?;
    }
    let bytes = std::fs::read(staged.path())?;
    debug!(url, len = bytes.len(), "document downloaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_gate() {
        assert_eq!(format_from_extension("brief.pdf").unwrap(), DocFormat::Pdf);
        assert_eq!(format_from_extension("Brief.PDF").unwrap(), DocFormat::Pdf);
        assert_eq!(
            format_from_extension("revision.docx").unwrap(),
            DocFormat::Docx
        );
        assert!(format_from_extension("notes.txt").is_err());
        assert!(format_from_extension("no_extension").is_err());
        assert!(format_from_extension(".pdf").is_err());
    }

    #[test]
    fn test_url_extension_ignores_query_and_fragment() {
        assert_eq!(
            format_from_extension("https://host/docs/a.pdf?token=x#page=2").unwrap(),
            DocFormat::Pdf
        );
        assert!(format_from_extension("https://host/docs/a.txt?name=b.pdf").is_err());
    }

    #[test]
    fn test_bytes_sniffing() {
        assert_eq!(format_from_bytes(b"%PDF-1.7 rest").unwrap(), DocFormat::Pdf);
        assert_eq!(
            format_from_bytes(b"PK\x03\x04 zipped").unwrap(),
            DocFormat::Docx
        );
        assert!(matches!(
            format_from_bytes(b"plain text"),
            Err(EngineError::UnsupportedFormat(_))
        ));
    }

    /// One-shot HTTP server on an ephemeral localhost port.
    async fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let header = format!(
                "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_download_stages_remote_pdf() {
        let body = b"%PDF-1.7 remote fixture".to_vec();
        let base = serve_once("HTTP/1.1 200 OK", body.clone()).await;

        let (bytes, format) = resolve(&DocRef::Url(format!("{base}/brief.pdf")))
            .await
            .unwrap();
        assert_eq!(format, DocFormat::Pdf);
        assert_eq!(bytes, body);
    }

    #[tokio::test]
    async fn test_download_http_error_status() {
        let base = serve_once("HTTP/1.1 404 Not Found", Vec::new()).await;
        let err = resolve(&DocRef::Url(format!("{base}/brief.pdf"))).await;
        assert!(matches!(err, Err(EngineError::Download(_))));
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let err = resolve(&DocRef::Path("/nonexistent/brief.pdf".into())).await;
        assert!(matches!(err, Err(EngineError::DocumentNotFound(_))));
    }

    #[tokio::test]
    async fn test_gate_runs_before_io() {
        // The path does not exist, but the extension is rejected first.
        let err = resolve(&DocRef::Path("/nonexistent/brief.odt".into())).await;
        assert!(matches!(err, Err(EngineError::UnsupportedFormat(_))));
    }
}
