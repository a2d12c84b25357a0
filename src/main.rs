mod app;
mod config;
mod fragment;
mod highlight;
mod html;
mod lines;
mod markdown;
mod meta;
mod node;
mod range;
mod render;
mod theme;
mod words;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pretty-code",
    version,
    about = "Render markdown code blocks as highlighted HTML"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Markdown file to render
    file: Option<PathBuf>,

    /// Write HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Re-render whenever the file changes
    #[arg(short, long)]
    watch: bool,

    /// Emit only the rendered body, without the page wrapper
    #[arg(long)]
    fragment: bool,

    /// Theme to use instead of the configured one
    #[arg(long)]
    theme: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the config file in $EDITOR (default: vi)
    Config,
    /// Manage themes
    Themes {
        #[command(subcommand)]
        command: ThemeCommands,
    },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// List available themes
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Commands::Config => return config::open_config_in_editor(),
            Commands::Themes { command } => match command {
                ThemeCommands::List => {
                    let cfg = config::load_config()?;
                    let manager = theme::ThemeManager::load(&cfg)?;
                    for name in manager.theme_names() {
                        println!("{name}");
                    }
                    return Ok(());
                }
            },
        }
    }

    let file = cli
        .file
        .ok_or_else(|| anyhow::anyhow!("No file provided. Try `pretty-code <file.md>`."))?;

    let mut cfg = config::load_config()?;
    if let Some(theme) = cli.theme {
        cfg.theme = theme;
        cfg.themes.clear();
    }

    let job = app::RenderJob {
        input: file,
        output: cli.output,
        fragment: cli.fragment,
    };
    app::run_app(job, cfg, cli.watch)
}
