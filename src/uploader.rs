use crate::chunker::TextChunker;
use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::models::{supported_extensions, DocumentFormat, UploadedDocument};
use crate::processor::DocumentProcessor;
use crate::utils::{self, BYTES_PER_MB};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_TEXT_NAME: &str = "pasted_text.txt";
const DEFAULT_DOWNLOAD_NAME: &str = "downloaded_document";

/// Validates and takes in documents from a local file, a URL, or pasted text
pub struct DocumentUploader {
    max_file_size_mb: u64,
    processor: DocumentProcessor,
    client: Client,
    download_dir: Option<PathBuf>,
    temp_root: Option<PathBuf>,
}

impl DocumentUploader {
    /// Create an uploader with the given size cap and default chunking
    pub fn new(max_file_size_mb: u64) -> Self {
        Self {
            max_file_size_mb,
            processor: DocumentProcessor::new(),
            client: Client::new(),
            download_dir: None,
            temp_root: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.overlap)?;
        debug!(
            max_file_size_mb = config.upload.max_file_size_mb,
            chunk_size = chunker.chunk_size(),
            overlap = chunker.overlap(),
            "uploader configured"
        );
        Ok(Self::new(config.upload.max_file_size_mb)
            .with_processor(DocumentProcessor::with_chunker(chunker))
            .with_download_dir(config.upload.download_dir.clone())
            .with_temp_root(config.upload.temp_dir.clone()))
    }

    pub fn with_processor(mut self, processor: DocumentProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Default directory for URL downloads when the call does not name one
    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.download_dir = dir;
        self
    }

    /// Parent directory for scratch download directories
    pub fn with_temp_root(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_root = dir;
        self
    }

    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_mb
    }

    fn max_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Take in a local file: check existence, size and format, then extract and chunk
    pub async fn upload_from_file(&self, path: impl AsRef<Path>) -> Result<UploadedDocument> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }

        let size = tokio::fs::metadata(path).await?.len();
        let size_mb = utils::bytes_to_mb(size);
        if size_mb > self.max_file_size_mb as f64 {
            return Err(IngestError::SizeLimit {
                size_mb: Some(size_mb),
                limit_mb: self.max_file_size_mb,
            });
        }

        let extension = utils::get_extension(path).unwrap_or_default();
        let format = DocumentFormat::from_extension(&extension)
            .ok_or_else(|| DocumentFormat::unsupported(&extension))?;

        let content = self.processor.process_document(path).await?;
        let chunks = self.processor.chunk_text(&content);
        info!(
            file = %path.display(),
            %format,
            chars = content.chars().count(),
            chunks = chunks.len(),
            "document ingested"
        );

        Ok(UploadedDocument::new(utils::display_name(path), format, content, chunks))
    }

    /// Download a document and take it in as a local file
    ///
    /// Without a `download_dir` (here or configured), the file lands in a
    /// scratch directory that is removed when this call returns, whatever
    /// the outcome.
    pub async fn upload_from_url(
        &self,
        url: &str,
        download_dir: Option<&Path>,
    ) -> Result<UploadedDocument> {
        let parsed = parse_url(url)?;
        let file_name = file_name_from_url(&parsed);

        let target_dir = download_dir
            .map(Path::to_path_buf)
            .or_else(|| self.download_dir.clone());

        // Held until the end of the call; dropping it deletes the directory
        let (_scratch, dir) = match target_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(&dir).await?;
                (None, dir)
            }
            None => {
                let scratch = self.scratch_dir()?;
                let dir = scratch.path().to_path_buf();
                (Some(scratch), dir)
            }
        };

        let local_path = self.download(&parsed, &file_name, &dir).await?;
        self.upload_from_file(&local_path).await
    }

    /// Take in pasted text under a display name
    pub fn upload_from_text(&self, text: &str, file_name: Option<&str>) -> Result<UploadedDocument> {
        if text.is_empty() {
            return Err(IngestError::EmptyInput);
        }

        let chunks = self.processor.chunk_text(text);
        debug!(chars = text.chars().count(), chunks = chunks.len(), "pasted text ingested");

        Ok(UploadedDocument::new(
            file_name.unwrap_or(DEFAULT_TEXT_NAME),
            DocumentFormat::Txt,
            text.to_string(),
            chunks,
        ))
    }

    /// Extensions accepted by every intake mode
    pub fn get_supported_formats(&self) -> Vec<&'static str> {
        supported_extensions()
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("studywise-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Stream the response body into `dir`, returning the written file's path
    async fn download(&self, url: &Url, file_name: &str, dir: &Path) -> Result<PathBuf> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| connection_error(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(connection_error(url, format!("status code {}", status.as_u16())));
        }

        let format = resolve_format(&response, file_name)?;
        debug!(%url, %format, "resolved download format");

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes() {
                return Err(IngestError::SizeLimit {
                    size_mb: Some(utils::bytes_to_mb(declared)),
                    limit_mb: self.max_file_size_mb,
                });
            }
        }

        let path = dir.join(local_file_name(file_name, format));
        match self.write_body(response, url, &path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes, "download complete");
                Ok(path)
            }
            Err(e) => {
                // Partial data must not outlive a failed download
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    /// Write the body chunk by chunk, aborting once the running total passes the cap
    async fn write_body(&self, mut response: Response, url: &Url, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| connection_error(url, e.to_string()))?
        {
            downloaded += chunk.len() as u64;
            if downloaded > self.max_bytes() {
                return Err(IngestError::SizeLimit {
                    size_mb: None,
                    limit_mb: self.max_file_size_mb,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(downloaded)
    }
}

impl Default for DocumentUploader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE_MB)
    }
}

fn connection_error(url: &Url, reason: String) -> IngestError {
    IngestError::Connection {
        url: url.to_string(),
        reason,
    }
}

/// Accept only absolute URLs with both a scheme and a host
fn parse_url(url: &str) -> Result<Url> {
    let invalid = |reason: String| IngestError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

/// Last path segment of the URL, or a placeholder when there is none
fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DOWNLOAD_NAME)
        .to_string()
}

/// Declared content type first, then the URL's own extension
fn resolve_format(response: &Response, file_name: &str) -> Result<DocumentFormat> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let url_extension = utils::get_extension(Path::new(file_name)).unwrap_or_default();

    DocumentFormat::from_mime(content_type)
        .or_else(|| DocumentFormat::from_extension(&url_extension))
        .ok_or_else(|| DocumentFormat::unsupported(&url_extension))
}

/// Make sure the saved file carries the extension its format dispatches on
fn local_file_name(file_name: &str, format: DocumentFormat) -> String {
    match utils::get_extension(Path::new(file_name)) {
        Some(ext) if ext == format.extension() => file_name.to_string(),
        _ => format!("{}.{}", file_name, format.extension()),
    }
}
