//! fat32-tree - print the directory tree of a FAT32 image

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fat32_tree::fat32::Fat32Volume;
use fat32_tree::logger;
use fat32_tree::render::{render_json, tree_line, Output};

#[derive(Debug, Parser)]
#[command(name = "fat32-tree", version)]
#[command(about = "Print the directory tree of a FAT32 volume image")]
struct Cli {
    /// FAT32 image to inspect
    image: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Tree)]
    format: Format,

    /// Print the decoded BIOS Parameter Block before the tree
    #[arg(long)]
    show_bpb: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Tree,
    Json,
}

/// Writes to stdout, keeping the first failure; later writes are dropped.
struct ConsoleOutput<W> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleOutput<W> {
    fn new(writer: W) -> Self {
        ConsoleOutput { writer, error: None }
    }

    /// Flush and report the first write error, if any.
    fn finish(&mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()
    }
}

impl<W: Write> Output for ConsoleOutput<W> {
    fn write_str(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(s.as_bytes()) {
            self.error = Some(e);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut out = ConsoleOutput::new(io::stdout().lock());

    let mut volume = Fat32Volume::open(&cli.image)
        .with_context(|| format!("error occurred while processing disk {}", cli.image.display()))?;

    if cli.show_bpb {
        out.write_line(&volume.geometry().to_string());
    }

    match cli.format {
        Format::Tree => volume
            .walk_with(|node| out.write_line(&tree_line(node)))
            .context("could not read the disk")?,
        Format::Json => {
            let nodes = volume.walk().context("could not read the disk")?;
            out.write_line(&render_json(&nodes)?);
        }
    }

    out.finish().context("could not write output")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // usage errors exit with 1, --help and --version with 0
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let env_level = std::env::var(logger::LOG_ENV).ok();
    if let Err(e) = logger::init(logger::resolve_level(cli.verbose, env_level.as_deref())) {
        eprintln!("cannot install logger: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
