use anyhow::{Result, bail};
use clap::Parser;

use crate::config;
use crate::console::Console;
use crate::driver;

/// Organize a comic collection: resolve each archive against the
/// configured catalog services, refresh its metadata sidecars, and
/// file it under publisher and series.
#[derive(Debug, Parser)]
#[command(name = "longbox", version)]
struct Cli {
    /// Pass FORCE to re-resolve archives whose metadata is still fresh
    force: Option<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let force = match cli.force.as_deref() {
        None => false,
        Some(arg) if arg.eq_ignore_ascii_case("force") => true,
        Some(other) => bail!("unrecognised argument `{other}`; did you mean FORCE?"),
    };

    let settings = config::load()?;
    let mut console = Console;
    driver::run(&settings, force, &mut console)
}
