//! CLI for imagegrabber.

use anyhow::{Context, Result};
use clap::Parser;
use imagegrabber_core::config::{self, GrabberConfig};
use imagegrabber_core::report::RunEvent;
use imagegrabber_core::run;
use std::io::{self, Write};
use std::path::PathBuf;

/// Printed instead of running when no URL is given.
pub const USAGE: [&str; 3] = [
    "Usage:  imagegrabber URL",
    "   Where URL is the page containing image links to retrieve.",
    "   Multiple URLs may be specified, separated by spaces.",
];

/// Download the images linked from one or more web pages into the current
/// directory. Only one instance downloads at a time on this machine.
#[derive(Debug, Parser)]
#[command(name = "imagegrabber")]
#[command(about = "Download the images linked from web pages, one instance at a time", long_about = None)]
pub struct Cli {
    /// Pages containing image links to retrieve.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read settings from this TOML file instead of using the defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Strip query strings and unsafe characters from saved filenames.
    #[arg(long)]
    pub sanitize: bool,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    /// Settings for this invocation: the named file (or defaults) plus flags.
    pub fn load_config(&self) -> Result<GrabberConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => GrabberConfig::default(),
        };
        if self.sanitize {
            cfg.sanitize_filenames = true;
        }
        Ok(cfg)
    }

    pub fn run(self) -> Result<()> {
        if self.urls.is_empty() {
            let mut out = io::stdout().lock();
            for line in USAGE {
                writeln!(out, "{}", line).context("failed to write to stdout")?;
            }
            return Ok(());
        }

        let cfg = self.load_config()?;
        tracing::debug!("effective config: {:?}", cfg);
        let download_dir = std::env::current_dir()?;

        let mut console = Console::new(io::stdout().lock());
        run::run(&cfg, &download_dir, &self.urls, |event| console.emit(event))?;
        console.finish()
    }
}

/// Prints run events one line at a time, flushing after each.
///
/// A write failure does not stop the downloads; it is logged once, later
/// events are dropped, and `finish` turns it into the run's error.
struct Console<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Console<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn emit(&mut self, event: &RunEvent) {
        if self.error.is_some() {
            return;
        }
        let res = writeln!(self.out, "{}", event).and_then(|()| self.out.flush());
        if let Err(e) = res {
            tracing::warn!("cannot write console output: {}", e);
            self.error = Some(e);
        }
    }

    fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e).context("failed to write to stdout"),
            None => Ok(()),
        }
    }
}
