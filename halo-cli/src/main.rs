use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use halo_cli::{check_cmd, init_logging, render_cmd, RenderArgs};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "halo", version, about = "Halo template CLI")]
struct Cli {
    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a template against JSON data and print the result.
    Render {
        /// Template file
        template: PathBuf,
        /// JSON object used as the initial data
        #[arg(long)]
        data: Option<PathBuf>,
        /// `path=json` write applied after mounting (repeatable)
        #[arg(long = "set", value_name = "PATH=JSON")]
        sets: Vec<String>,
        /// Read the file as a page and mount at this selector
        #[arg(long)]
        selector: Option<String>,
        /// Write the output here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// JSON engine configuration
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directive attribute prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Suppress informational logging
        #[arg(long)]
        silent: bool,
    },
    /// Parse a template and every expression in it.
    Check {
        template: PathBuf,
        #[arg(long, default_value = "m-")]
        prefix: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.command {
        Commands::Render {
            template,
            data,
            sets,
            selector,
            out,
            config,
            prefix,
            silent,
        } => {
            let args = RenderArgs {
                data,
                sets,
                selector,
                config,
                prefix,
                silent,
            };
            let html = render_cmd(&template, &args)?;
            match out {
                Some(path) => fs::write(&path, html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{html}"),
            }
        }
        Commands::Check { template, prefix } => {
            let problems = check_cmd(&template, &prefix)?;
            for p in &problems {
                eprintln!("{}: {}", p.location, p.message);
            }
            if !problems.is_empty() {
                bail!("{} problem(s) in {}", problems.len(), template.display());
            }
            println!("ok");
        }
    }
    Ok(())
}
