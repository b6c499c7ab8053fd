use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use url::Url;

use crate::config::{
    ARCHIVE_BASE_URL, ARCHIVE_BASE_URL_ENV, IA_PATH_ENV, TORRENT_BINARY, TORRENT_BINARY_ENV,
};

pub const TORRENT_EXAMPLE: &str = "Example: create_torrent 'Nothing_OS_2.5.2.zip'";
pub const UPLOAD_EXAMPLE: &str =
    "Example: upload_rom 'Nothing_OS_2.5.2.zip' 'Nothing OS 2.5.2' 'Nothing Phone (1)' 'Android 14' 'Latest stable build'";

/// Create a .torrent file for a ROM using an external torrent tool
#[derive(Parser, Debug)]
#[command(
    name = "create_torrent",
    version,
    after_help = TORRENT_EXAMPLE
)]
pub struct TorrentArgs {
    /// ROM file to create the torrent for
    pub rom_file: PathBuf,

    /// Tracker announce URL, repeatable. Defaults to a built-in list of public trackers
    #[arg(short = 'a', long = "tracker", value_name = "URL")]
    pub trackers: Vec<String>,

    /// Torrent creation binary
    #[arg(long, env = TORRENT_BINARY_ENV, default_value = TORRENT_BINARY)]
    pub torrent_bin: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv, -vvvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Upload a ROM file to the Internet Archive with descriptive metadata
#[derive(Parser, Debug)]
#[command(
    name = "upload_rom",
    version,
    after_help = UPLOAD_EXAMPLE
)]
pub struct UploadArgs {
    /// ROM file to upload
    pub rom_file: PathBuf,

    /// ROM name, e.g. "Nothing OS 2.5.2"
    pub rom_name: String,

    /// Device model, e.g. "Nothing Phone (1)"
    pub device_model: String,

    /// Android version, e.g. "Android 14" [default: Android]
    pub android_version: Option<String>,

    /// Additional description
    pub description: Option<String>,

    /// Path to the `ia` upload binary. Searched on PATH when unset
    #[arg(long, env = IA_PATH_ENV)]
    pub ia_bin: Option<PathBuf>,

    /// Base URL of the archive used for the reported links
    #[arg(long, env = ARCHIVE_BASE_URL_ENV, default_value = ARCHIVE_BASE_URL)]
    pub archive_url: Url,

    /// Value of the `date` metadata field [default: current year]
    #[arg(long)]
    pub date: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv, -vvvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Usage errors exit with 1; `--help` and `--version` exit with 0.
pub fn exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

/// Writes clap's message, followed by the command's example line when the command line was wrong.
pub fn write_parse_error<P: CommandFactory>(out: &mut impl Write, err: &clap::Error) -> io::Result<()> {
    write!(out, "{}", err.render())?;

    if err.use_stderr() {
        if let Some(example) = P::command().get_after_help() {
            writeln!(out, "{}", example)?;
        }
    }

    out.flush()
}

/// Parses `args`, printing usage and exiting with status 1 on a bad command line.
pub fn parse_or_exit<P, I, T>(args: I) -> P
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match P::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(err) => {
            let _ = if err.use_stderr() {
                write_parse_error::<P>(&mut io::stderr(), &err)
            } else {
                write_parse_error::<P>(&mut io::stdout(), &err)
            };
            std::process::exit(exit_code(&err));
        }
    }
}

#[cfg(test)]
mod test {
    use clap::error::ErrorKind;

    use super::*;

    fn rendered<P: CommandFactory>(err: &clap::Error) -> String {
        let mut out = Vec::new();
        write_parse_error::<P>(&mut out, err).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands_are_well_formed() {
        TorrentArgs::command().debug_assert();
        UploadArgs::command().debug_assert();
    }

    #[test]
    fn torrent_args_collect_trackers_in_order() {
        let args = TorrentArgs::try_parse_from([
            "create_torrent",
            "-a",
            "udp://one:1/announce",
            "--tracker",
            "udp://two:2/announce",
            "rom.zip",
        ])
        .unwrap();

        assert_eq!(args.rom_file, PathBuf::from("rom.zip"));
        assert_eq!(args.trackers, ["udp://one:1/announce", "udp://two:2/announce"]);
    }

    #[test]
    fn torrent_args_require_file() {
        let err = TorrentArgs::try_parse_from(["create_torrent"]).unwrap_err();

        assert!(err.use_stderr());
    }

    #[test]
    fn upload_args_optional_positionals() {
        let args = UploadArgs::try_parse_from(["upload_rom", "rom.zip", "Nothing OS 2.5.2", "Nothing Phone (1)"]).unwrap();

        assert_eq!(args.android_version, None);
        assert_eq!(args.description, None);

        let args = UploadArgs::try_parse_from([
            "upload_rom",
            "rom.zip",
            "Nothing OS 2.5.2",
            "Nothing Phone (1)",
            "Android 14",
            "Latest stable build",
        ])
        .unwrap();

        assert_eq!(args.android_version.as_deref(), Some("Android 14"));
        assert_eq!(args.description.as_deref(), Some("Latest stable build"));
    }

    #[test]
    fn upload_args_need_three_positionals() {
        let err = UploadArgs::try_parse_from(["upload_rom", "rom.zip", "Nothing OS 2.5.2"]).unwrap_err();

        assert!(err.use_stderr());
    }

    #[test]
    fn upload_args_parse_archive_url() {
        let args = UploadArgs::try_parse_from([
            "upload_rom",
            "--archive-url",
            "http://localhost:9000/",
            "rom.zip",
            "name",
            "device",
        ])
        .unwrap();

        assert_eq!(args.archive_url.as_str(), "http://localhost:9000/");
    }

    #[test]
    fn usage_errors_exit_with_one() {
        let missing = TorrentArgs::try_parse_from(["create_torrent"]).unwrap_err();
        let too_few = UploadArgs::try_parse_from(["upload_rom", "rom.zip", "Nothing OS 2.5.2"]).unwrap_err();

        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(exit_code(&missing), 1);
        assert_eq!(too_few.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(exit_code(&too_few), 1);
    }

    #[test]
    fn help_and_version_exit_with_zero() {
        let help = TorrentArgs::try_parse_from(["create_torrent", "--help"]).unwrap_err();
        let version = UploadArgs::try_parse_from(["upload_rom", "--version"]).unwrap_err();

        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        assert_eq!(exit_code(&help), 0);
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
        assert_eq!(exit_code(&version), 0);
    }

    #[test]
    fn usage_error_ends_with_example() {
        let err = TorrentArgs::try_parse_from(["create_torrent"]).unwrap_err();

        let out = rendered::<TorrentArgs>(&err);

        assert!(out.contains("Usage: create_torrent"), "{out}");
        assert!(out.trim_end().ends_with(TORRENT_EXAMPLE), "{out}");

        let err = UploadArgs::try_parse_from(["upload_rom", "rom.zip"]).unwrap_err();

        assert!(rendered::<UploadArgs>(&err).trim_end().ends_with(UPLOAD_EXAMPLE));
    }

    #[test]
    fn version_output_has_no_example() {
        let err = TorrentArgs::try_parse_from(["create_torrent", "--version"]).unwrap_err();

        assert!(!rendered::<TorrentArgs>(&err).contains("Example:"));
    }
}
