use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::process::{self, execute, Invocation, Runner};

/// Public UDP trackers announced when the caller supplies none.
pub static DEFAULT_TRACKERS: [&str; 5] = [
    "udp://tracker.openbittorrent.com:80/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://9.rarbg.to:2710/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.torrent.eu.org:451/announce",
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ROM file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error(transparent)]
    Process(#[from] process::Error),
    #[error("failed to write status output: {0}")]
    Io(#[from] io::Error),
}

/// `<dir>/<stem>.torrent` next to the source file.
pub fn torrent_path(source: &Path) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(".torrent");

    source.with_file_name(name)
}

pub fn torrent_invocation<S: AsRef<str>>(binary: &Path, source: &Path, trackers: &[S]) -> Invocation {
    let mut invocation = Invocation::new(binary);

    if trackers.is_empty() {
        for tracker in DEFAULT_TRACKERS {
            invocation = invocation.args(["-a", tracker]);
        }
    } else {
        for tracker in trackers {
            invocation = invocation.args(["-a", tracker.as_ref()]);
        }
    }

    invocation.arg("-o").arg(torrent_path(source)).arg(source)
}

pub struct TorrentCreator<R> {
    runner: R,
    binary: PathBuf,
}

impl<R: Runner> TorrentCreator<R> {
    pub fn new(runner: R, binary: impl Into<PathBuf>) -> Self {
        Self { runner, binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Asks the external binary to write a `.torrent` beside `source` and returns its path.
    ///
    /// An empty `trackers` slice means [`DEFAULT_TRACKERS`]. Status lines are written to `out`.
    pub async fn create<S: AsRef<str>>(
        &self,
        source: &Path,
        trackers: &[S],
        out: &mut impl Write,
    ) -> Result<PathBuf, Error> {
        if !is_file(source).await {
            return Err(Error::FileNotFound(source.to_path_buf()));
        }

        let invocation = torrent_invocation(&self.binary, source, trackers);
        let torrent = torrent_path(source);

        match execute(&self.runner, &invocation).await {
            Ok(_) => {
                info!(torrent = %torrent.display(), "torrent created");
                let name = torrent.file_name().unwrap_or_default().to_string_lossy();
                writeln!(out, "✅ Torrent created: {}", name)?;

                Ok(torrent)
            }
            Err(err) => {
                warn!(error = %err, "torrent creation failed");
                writeln!(
                    out,
                    "{} not found or failed. Install qBittorrent or Transmission first.",
                    self.binary.display()
                )?;
                writeln!(out, "Or use any torrent client to manually create torrents.")?;
                if let Some(stderr) = err.stderr().filter(|stderr| !stderr.trim().is_empty()) {
                    writeln!(out, "Error output: {}", stderr.trim_end())?;
                }

                Err(err.into())
            }
        }
    }
}

/// Writes the closing summary for a torrent run and returns the process exit status for it.
pub fn report(out: &mut impl Write, result: &Result<PathBuf, Error>) -> io::Result<i32> {
    match result {
        Ok(torrent) => {
            writeln!(out, "\n🎉 Success! Torrent file created.")?;
            writeln!(out, "📁 Torrent file: {}", torrent.display())?;
            writeln!(out, "\n📋 Next steps:")?;
            writeln!(out, "1. Upload the .torrent file to your GitHub repo")?;
            writeln!(out, "2. Start seeding the ROM file")?;
            writeln!(out, "3. Add download links to your website")?;
            Ok(0)
        }
        Err(err) => {
            if let Error::FileNotFound(_) = err {
                writeln!(out, "Error: {}", err)?;
            }
            writeln!(out, "\n❌ Failed to create torrent")?;
            Ok(1)
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|meta| meta.is_file()).unwrap_or(false)
}
