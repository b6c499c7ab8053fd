use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use url::Url;

use crate::process::{self, execute, Invocation, Runner};

pub const IDENTIFIER_PREFIX: &str = "nothing-rom";
pub const DEFAULT_OS_VERSION: &str = "Android";

const CREATOR: &str = "NothingROMs Community";
const MEDIA_TYPE: &str = "software";
const COLLECTION: &str = "opensource_software";
const LANGUAGE: &str = "eng";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ROM file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error(transparent)]
    Process(#[from] process::Error),
    #[error("invalid archive url: {0}")]
    Url(#[from] url::ParseError),
    #[error("archive url {0} cannot hold a path")]
    BaseUrl(Url),
    #[error("failed to write status output: {0}")]
    Io(#[from] io::Error),
}

/// Item identifier on the archive: `nothing-rom-<device>-<name>`.
///
/// Purely textual, so equal inputs always give the same identifier. Nothing is checked remotely.
pub fn item_identifier(display_name: &str, device_model: &str) -> String {
    format!("{}-{}-{}", IDENTIFIER_PREFIX, slug(device_model), slug(display_name))
}

fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if matches!(c, ' ' | '.') { '-' } else { c })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

/// Ordered key/value fields attached to an uploaded item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    fields: Vec<(&'static str, MetadataValue)>,
}

impl Metadata {
    pub fn for_request(request: &UploadRequest) -> Self {
        let name = &request.display_name;
        let device = &request.device_model;
        let mut description = format!("Nothing OS ROM - {} for {}.", name, device);
        if !request.description.is_empty() {
            description.push(' ');
            description.push_str(&request.description);
        }

        let fields = vec![
            ("title", MetadataValue::Text(format!("{} for {}", name, device))),
            ("description", MetadataValue::Text(description)),
            (
                "subject",
                MetadataValue::List(vec![
                    "Android ROM".to_string(),
                    "Nothing OS".to_string(),
                    "Custom ROM".to_string(),
                    device.clone(),
                    request.os_version.clone(),
                ]),
            ),
            ("creator", MetadataValue::Text(CREATOR.to_string())),
            ("mediatype", MetadataValue::Text(MEDIA_TYPE.to_string())),
            ("collection", MetadataValue::Text(COLLECTION.to_string())),
            ("language", MetadataValue::Text(LANGUAGE.to_string())),
            ("date", MetadataValue::Text(request.date.clone())),
        ];

        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(&'static str, MetadataValue)] {
        &self.fields
    }

    /// One `--metadata=<key>:<value>` flag per scalar, and one per element of a list.
    pub fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();

        for (key, value) in &self.fields {
            match value {
                MetadataValue::Text(text) => flags.push(format!("--metadata={}:{}", key, text)),
                MetadataValue::List(items) => {
                    flags.extend(items.iter().map(|item| format!("--metadata={}:{}", key, item)))
                }
            }
        }

        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub display_name: String,
    pub device_model: String,
    pub os_version: String,
    pub description: String,
    pub date: String,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>, display_name: impl Into<String>, device_model: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            display_name: display_name.into(),
            device_model: device_model.into(),
            os_version: DEFAULT_OS_VERSION.to_string(),
            description: String::new(),
            date: current_year(),
        }
    }

    pub fn os_version(mut self, os_version: Option<String>) -> Self {
        if let Some(os_version) = os_version {
            self.os_version = os_version;
        }
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        if let Some(description) = description {
            self.description = description;
        }
        self
    }

    pub fn date(mut self, date: Option<String>) -> Self {
        if let Some(date) = date {
            self.date = date;
        }
        self
    }

    pub fn identifier(&self) -> String {
        item_identifier(&self.display_name, &self.device_model)
    }

    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}

pub fn current_year() -> String {
    use chrono::Datelike;

    chrono::Local::now().year().to_string()
}

pub fn upload_invocation(binary: &Path, request: &UploadRequest) -> Invocation {
    Invocation::new(binary)
        .arg("upload")
        .arg(request.identifier())
        .arg(&request.file)
        .args(Metadata::for_request(request).flags())
}

/// Public page locations on the archive. Nothing is fetched to confirm they exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUrls {
    base: Url,
}

impl ArchiveUrls {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn parse(base: &str) -> Result<Self, Error> {
        Ok(Self::new(Url::parse(base)?))
    }

    pub fn details(&self, identifier: &str) -> Result<Url, Error> {
        self.with_segments(&["details", identifier])
    }

    pub fn download(&self, identifier: &str, file_name: &str) -> Result<Url, Error> {
        self.with_segments(&["download", identifier, file_name])
    }

    fn with_segments(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::BaseUrl(self.base.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub identifier: String,
    pub details_url: Url,
    pub download_url: Url,
}

pub struct Uploader<R> {
    runner: R,
    binary: PathBuf,
    urls: ArchiveUrls,
}

impl<R: Runner> Uploader<R> {
    pub fn new(runner: R, binary: impl Into<PathBuf>, urls: ArchiveUrls) -> Self {
        Self { runner, binary: binary.into(), urls }
    }

    /// Pushes the file with its metadata through the upload binary. Status lines are written to `out`.
    pub async fn upload(&self, request: &UploadRequest, out: &mut impl Write) -> Result<UploadReceipt, Error> {
        if !tokio::fs::try_exists(&request.file).await.unwrap_or(false) {
            return Err(Error::FileNotFound(request.file.clone()));
        }

        let identifier = request.identifier();
        let file_name = request.file_name();
        let invocation = upload_invocation(&self.binary, request);

        writeln!(out, "Uploading {} to Internet Archive...", file_name)?;
        writeln!(out, "Item identifier: {}", identifier)?;
        writeln!(out, "This may take a while for large files...")?;

        if let Err(err) = execute(&self.runner, &invocation).await {
            warn!(identifier = %identifier, error = %err, "upload failed");
            return Err(err.into());
        }

        let details_url = self.urls.details(&identifier)?;
        let download_url = self.urls.download(&identifier, &file_name)?;
        info!(identifier = %identifier, url = %details_url, "upload finished");

        writeln!(out, "Upload successful!")?;
        writeln!(out, "View your upload at: {}", details_url)?;
        writeln!(out, "Direct download link: {}", download_url)?;

        Ok(UploadReceipt { identifier, details_url, download_url })
    }
}

/// Writes the closing banner for an upload and returns the process exit status for it.
pub fn report(out: &mut impl Write, result: &Result<UploadReceipt, Error>) -> io::Result<i32> {
    match result {
        Ok(receipt) => {
            writeln!(out, "\n✅ Upload completed successfully!")?;
            writeln!(out, "📱 Item ID: {}", receipt.identifier)?;
            Ok(0)
        }
        Err(err) => {
            match err {
                Error::FileNotFound(_) => writeln!(out, "Error: {}", err)?,
                Error::Process(process) => {
                    writeln!(out, "Upload failed: {}", process)?;
                    if let Some(stderr) = process.stderr().filter(|stderr| !stderr.trim().is_empty()) {
                        writeln!(out, "Error output: {}", stderr.trim_end())?;
                    }
                }
                _ => writeln!(out, "Upload failed: {}", err)?,
            }
            writeln!(out, "\n❌ Upload failed!")?;
            Ok(1)
        }
    }
}
