use std::io::{self, Write};
use std::path::Path;

/// Explains how to get a magnet link for `torrent` from a torrent client.
///
/// Nothing is read from the torrent file; the link itself comes from the client.
pub fn print_magnet_instructions(out: &mut impl Write, torrent: &Path) -> io::Result<()> {
    writeln!(out, "📎 To get magnet link:")?;
    writeln!(out, "1. Open {} in your torrent client", torrent.display())?;
    writeln!(out, "2. Right-click and copy magnet link")?;
    writeln!(out, "3. Add the magnet link to your website")?;

    out.flush()
}
