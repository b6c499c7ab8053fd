use std::io;

use rom_seed::args::{parse_or_exit, UploadArgs};
use rom_seed::config::{resolve_binary, IA_BINARY, IA_PATH_ENV};
use rom_seed::logging;
use rom_seed::process::SystemRunner;
use rom_seed::upload::{self, ArchiveUrls, UploadRequest, Uploader};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: UploadArgs = parse_or_exit(std::env::args_os());

    if let Err(err) = logging::init(args.verbose) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    let ia = match resolve_binary(args.ia_bin.as_deref(), IA_BINARY, IA_PATH_ENV) {
        Ok(ia) => ia,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let request = UploadRequest::new(args.rom_file, args.rom_name, args.device_model)
        .os_version(args.android_version)
        .description(args.description)
        .date(args.date);

    let uploader = Uploader::new(SystemRunner, ia, ArchiveUrls::new(args.archive_url));

    let mut stdout = io::stdout();
    let result = uploader.upload(&request, &mut stdout).await;
    let code = upload::report(&mut stdout, &result).unwrap_or(1);

    if code != 0 {
        std::process::exit(code);
    }
}
