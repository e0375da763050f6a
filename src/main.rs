//! Command-line entry point: load the per-symbol YAML descriptions and run a generator.
//!
//! ```text
//! refman -g md -i docs/yaml -s docs/sitemap.txt -o build/docs --link-defs build/refman.links
//! refman -g pickle -o build/refman.bin
//! refman -g print -o -
//! ```

mod output;

use anyhow::{Context, Result};
use clap::Parser;
use output::Output;
use refman::depfile;
use refman::generator::{self, GeneratorOptions};
use refman::loader::{self, LoaderOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "refman",
    version,
    about = "Generate the reference manual from per-symbol YAML descriptions"
)]
struct Cli {
    /// Loader backend
    #[arg(short = 'l', long, default_value = "yaml")]
    loader: String,

    /// Generator backend: print, pickle or md
    #[arg(short = 'g', long)]
    generator: String,

    /// Root directory of the description documents
    #[arg(short = 'i', long, default_value = "docs/yaml")]
    input: PathBuf,

    /// Sitemap driving the markdown generator
    #[arg(short = 's', long, default_value = "docs/sitemap.txt")]
    sitemap: PathBuf,

    /// Output directory (md) or file (pickle)
    #[arg(short = 'o', long)]
    out: PathBuf,

    /// Write the link-definition file here
    #[arg(long)]
    link_defs: Option<PathBuf>,

    /// Write a dependency file listing every input
    #[arg(long)]
    depfile: Option<PathBuf>,

    /// Color diagnostics and printed output even when not on a terminal
    #[arg(long)]
    force_color: bool,

    /// Do not generate module pages
    #[arg(long)]
    no_modules: bool,

    /// Log progress (equivalent to RUST_LOG=info)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.force_color {
        console::set_colors_enabled(true);
        console::set_colors_enabled_stderr(true);
    }
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let loaders = loader::registry();
    let generators = generator::registry();
    // Resolve both backends before doing any work.
    let make_loader = loaders.get(&cli.loader)?;
    let make_generator = generators.get(&cli.generator)?;

    let mut loader = make_loader(&LoaderOptions::new(&cli.input));
    let manual = loader.load()?;

    let options = GeneratorOptions {
        out: cli.out.clone(),
        sitemap: cli.sitemap.clone(),
        link_defs: cli.link_defs.clone(),
        modules: !cli.no_modules,
        force_color: cli.force_color,
    };
    let mut generator = make_generator(&manual, &options);
    generator.generate()?;

    if let Some(path) = &cli.depfile {
        let mut inputs = loader.input_files().to_vec();
        inputs.extend(generator.input_files());
        inputs.push(std::env::current_exe().context("failed to locate the running executable")?);
        depfile::write(path, &cli.out, &inputs)?;
        debug!(depfile = %path.display(), inputs = inputs.len(), "depfile written");
    }
    Ok(())
}
