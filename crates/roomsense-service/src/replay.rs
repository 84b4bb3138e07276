//! Offline replay of recorded device payloads.
//!
//! Input is JSON lines, one raw device payload per line. Each valid line is
//! run through a fresh [`ProcessingSession`] and its processed result is
//! written as one JSON line. Invalid lines are reported and skipped without
//! touching the session.

use std::io::{self, BufRead, Write};

use roomsense_core::{ProcessingSession, parse_reading_str};
use roomsense_types::ParseError;

/// Counts from one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub processed: usize,
    pub skipped: usize,
}

/// Replay `input` into `output`.
///
/// `on_invalid` receives the 1-based line number and the validation error of
/// every rejected line. Blank lines are ignored.
pub fn replay<R, W, F>(input: R, mut output: W, mut on_invalid: F) -> io::Result<ReplaySummary>
where
    R: BufRead,
    W: Write,
    F: FnMut(usize, &ParseError),
{
    let mut session = ProcessingSession::new();
    let mut summary = ReplaySummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_reading_str(&line) {
            Ok(reading) => {
                let result = session.process(&reading);
                serde_json::to_writer(&mut output, &result)?;
                output.write_all(b"\n")?;
                summary.processed += 1;
            }
            Err(e) => {
                on_invalid(index + 1, &e);
                summary.skipped += 1;
            }
        }
    }

    output.flush()?;
    Ok(summary)
}
