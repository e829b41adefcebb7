//! Sample video fetching through an external `yt-dlp` process.

use crate::{constants::DEFAULT_DOWNLOAD_MAX_HEIGHT, Error, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default directory downloaded videos land in
pub const DEFAULT_VIDEO_DIR: &str = "data/videos";

/// Default downloader executable
pub const DEFAULT_YT_DLP: &str = "yt-dlp";

/// Downloads remote videos into a local directory
#[derive(Debug, Clone)]
pub struct VideoDownloader {
    output_dir: PathBuf,
    max_height: u32,
    program: String,
}

impl VideoDownloader {
    /// Create a downloader writing into `output_dir`, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            max_height: DEFAULT_DOWNLOAD_MAX_HEIGHT,
            program: DEFAULT_YT_DLP.to_string(),
        })
    }

    /// Cap on the requested video height
    #[must_use]
    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = max_height;
        self
    }

    /// Use a different `yt-dlp` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Arguments passed to `yt-dlp` for one item
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is empty or a Drive link without a file id
    pub fn command_args(&self, url: &str, output_name: &str) -> Result<Vec<String>> {
        let url = normalize_url(url)?;
        let template = self.output_dir.join(format!("{output_name}.%(ext)s"));
        Ok(vec![
            "-f".to_string(),
            format!("best[height<={}]", self.max_height),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
            url,
        ])
    }

    /// Fetch one video as `<output_dir>/<output_name>.<ext>`.
    ///
    /// Failures are logged with the url and cause, never propagated.
    pub fn download(&self, url: &str, output_name: &str) -> bool {
        match self.try_download(url, output_name) {
            Ok(()) => {
                info!("Downloaded: {output_name}");
                true
            }
            Err(e) => {
                error!("Error downloading {url}: {e}");
                false
            }
        }
    }

    /// Fetch every url in order as `sports_video_<n>`, one flag per item
    pub fn download_all(&self, urls: &[String]) -> Vec<bool> {
        if urls.is_empty() {
            warn!("No URLs provided. Please add videos manually to {}", self.output_dir.display());
            info!("Video naming format: sports_video_1.mp4, sports_video_2.mp4, etc.");
            return Vec::new();
        }

        urls.iter()
            .enumerate()
            .map(|(i, url)| self.download(url, &batch_name(i + 1)))
            .collect()
    }

    fn try_download(&self, url: &str, output_name: &str) -> Result<()> {
        let args = self.command_args(url, output_name)?;
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| Error::DownloadError(format!("could not run {}: {e}", self.program)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::DownloadError(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Name given to the `n`th (1-based) item of a batch
#[must_use]
pub fn batch_name(n: usize) -> String {
    format!("sports_video_{n}")
}

/// File id of a Google Drive share link, `None` for other urls
#[must_use]
pub fn drive_file_id(url: &str) -> Option<String> {
    if !url.contains("drive.google.com") && !url.contains("drive.usercontent.google.com") {
        return None;
    }

    if let Some(rest) = url.split("/file/d/").nth(1) {
        return non_empty(rest.split(['/', '?', '#']).next());
    }

    let query = url.split_once('?')?.1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("id="))
        .and_then(|id| non_empty(id.split('#').next()))
}

fn non_empty(id: Option<&str>) -> Option<String> {
    id.filter(|s| !s.is_empty()).map(str::to_string)
}

fn normalize_url(url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::DownloadError("empty url".to_string()));
    }
    if url.contains("drive.google.com") {
        let id = drive_file_id(url)
            .ok_or_else(|| Error::DownloadError(format!("no file id in Drive link {url}")))?;
        return Ok(format!("https://drive.google.com/file/d/{id}/view"));
    }
    Ok(url.to_string())
}
