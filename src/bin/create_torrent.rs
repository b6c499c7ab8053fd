use std::io;

use rom_seed::args::{parse_or_exit, TorrentArgs};
use rom_seed::logging;
use rom_seed::magnet::print_magnet_instructions;
use rom_seed::process::SystemRunner;
use rom_seed::torrent::{self, TorrentCreator};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: TorrentArgs = parse_or_exit(std::env::args_os());

    if let Err(err) = logging::init(args.verbose) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    let name = args.rom_file.file_name().unwrap_or(args.rom_file.as_os_str()).to_string_lossy();
    println!("Creating torrent for: {}", name);

    let creator = TorrentCreator::new(SystemRunner, &args.torrent_bin);
    let mut stdout = io::stdout();

    let result = creator.create(&args.rom_file, args.trackers.as_slice(), &mut stdout).await;
    let code = torrent::report(&mut stdout, &result).unwrap_or(1);

    if let Ok(torrent) = &result {
        if let Err(err) = print_magnet_instructions(&mut stdout, torrent) {
            eprintln!("Error generating magnet link: {}", err);
        }
    }

    if code != 0 {
        std::process::exit(code);
    }
}
