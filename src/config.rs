use std::path::{Path, PathBuf};

use tracing::debug;

pub const IA_BINARY: &str = "ia";
pub const IA_PATH_ENV: &str = "IA_PATH";

pub const TORRENT_BINARY: &str = "transmission-create";
pub const TORRENT_BINARY_ENV: &str = "TORRENT_CREATE_BIN";

pub const ARCHIVE_BASE_URL: &str = "https://archive.org/";
pub const ARCHIVE_BASE_URL_ENV: &str = "ARCHIVE_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configured binary does not exist: {}", .0.display())]
    MissingBinary(PathBuf),
    #[error("could not find `{name}` on PATH; set {env} to its location")]
    Unresolved { name: String, env: String },
}

/// Finds the binary to run: an explicitly configured path must exist, otherwise `PATH` is searched.
pub fn resolve_binary(explicit: Option<&Path>, name: &str, env: &str) -> Result<PathBuf, Error> {
    let search_paths = std::env::var_os("PATH")
        .map_or_else(Vec::new, |paths| std::env::split_paths(&paths).collect());

    resolve_in(explicit, name, env, search_paths)
}

fn resolve_in<I>(explicit: Option<&Path>, name: &str, env: &str, search_paths: I) -> Result<PathBuf, Error>
where
    I: IntoIterator<Item = PathBuf>,
{
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::MissingBinary(path.to_path_buf()))
        };
    }

    for dir in search_paths {
        for candidate in candidate_names(name) {
            let candidate = dir.join(candidate);

            if candidate.is_file() {
                debug!(binary = %candidate.display(), "resolved binary from PATH");
                return Ok(candidate);
            }
        }
    }

    Err(Error::Unresolved { name: name.to_string(), env: env.to_string() })
}

fn candidate_names(name: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}
