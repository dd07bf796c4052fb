// SPDX-License-Identifier: GPL-3.0-only

use std::io::{self, Write};

/// Human-readable per-volume progress lines.
///
/// Volumes are separated by a blank line; nothing precedes the first or
/// follows the last.
pub struct Progress<W: Write> {
    out: W,
    started: bool,
}

impl Progress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Progress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }

    pub fn begin_volume(&mut self, volume: &str) -> io::Result<()> {
        if self.started {
            writeln!(self.out)?;
        }
        self.started = true;
        writeln!(self.out, "syncing {volume}...")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_volumes_with_single_blank_line() {
        let mut progress = Progress::new(Vec::new());
        progress.begin_volume("root").unwrap();
        progress.begin_volume("home").unwrap();
        progress.begin_volume("srv").unwrap();

        let output = String::from_utf8(progress.into_inner()).unwrap();
        assert_eq!(output, "syncing root...\n\nsyncing home...\n\nsyncing srv...\n");
    }

    #[test]
    fn prints_nothing_until_first_volume() {
        let progress = Progress::new(Vec::new());
        assert!(progress.into_inner().is_empty());
    }
}
