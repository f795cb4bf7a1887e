//! Text command - find a date of birth in text that was already recognized.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::debug;

use zkid_core::{find_all_dates, DateOfBirth, ExtractionOutcome, UploadSession};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Text file (default: stdin)
    file: Option<PathBuf>,

    /// List every date-like substring, in order
    #[arg(long)]
    all: bool,

    /// Warn when the date is not a real or unambiguous calendar date
    #[arg(long)]
    validate: bool,
}

pub fn run(args: TextArgs) -> anyhow::Result<()> {
    let text = match &args.file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    debug!("Read {} bytes of text", text.len());

    let candidates = find_all_dates(&text);

    if args.validate {
        if let Some(first) = candidates.first() {
            for warning in first.calendar_warnings() {
                eprintln!("{} {}", style("⚠").yellow(), warning);
            }
        }
    }

    println!("{}", render(&candidates, args.all));

    Ok(())
}

fn render(candidates: &[DateOfBirth], all: bool) -> String {
    if all {
        return candidates
            .iter()
            .map(DateOfBirth::as_str)
            .collect::<Vec<_>>()
            .join("\n");
    }

    let outcome = match candidates.first() {
        Some(date) => ExtractionOutcome::Found(date.clone()),
        None => ExtractionOutcome::NotFound,
    };

    let mut session = UploadSession::new();
    let token = session.begin();
    session.complete(token, outcome);
    session.message()
}
