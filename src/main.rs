use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use livepreview::boundary::BoundaryBackend;
use livepreview::relay::GenerationGate;
use livepreview::{
    synthesize, util, Config, ConsolePrinter, ExternalResource, FileSnippetStore, MessageRelay,
    PreviewEngine, PreviewSurface, ProcessBoundary, Snippet, SnippetStore, SourceBundle,
    SourceKind, SourceWatcher,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "livepreview", version, about = "Sandboxed live preview for HTML/CSS/JS snippets")]
struct Cli {
    /// Data directory (default: ~/.livepreview)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the synthesized preview document
    Synth(SourceArgs),
    /// Load the preview once and print its console output
    Run {
        #[command(flatten)]
        sources: SourceArgs,
        /// How long to keep the preview running
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
    },
    /// Reload the preview whenever the source files change
    Watch {
        #[command(flatten)]
        sources: SourceArgs,
        /// Override the configured debounce quiet period
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Save the sources as a snippet and print its id
    Save {
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Markup file
    #[arg(long)]
    html: Option<PathBuf>,
    /// Stylesheet file
    #[arg(long)]
    css: Option<PathBuf>,
    /// Script file
    #[arg(long)]
    js: Option<PathBuf>,
    /// External stylesheet URL (repeatable)
    #[arg(long = "lib-css")]
    lib_css: Vec<String>,
    /// External script URL (repeatable)
    #[arg(long = "lib-js")]
    lib_js: Vec<String>,
    /// Load sources from a saved snippet instead of files
    #[arg(long, conflicts_with_all = ["html", "css", "js"])]
    snippet: Option<String>,
}

fn read_optional(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => Ok(String::new()),
    }
}

impl SourceArgs {
    fn resources(&self) -> Vec<ExternalResource> {
        self.lib_css
            .iter()
            .map(ExternalResource::stylesheet)
            .chain(self.lib_js.iter().map(ExternalResource::script))
            .collect()
    }

    fn load(&self, config: &Config) -> Result<SourceBundle> {
        let mut bundle = match &self.snippet {
            Some(id) => FileSnippetStore::new(&config.snippets_dir)
                .load(id)
                .with_context(|| format!("Failed to load snippet {id}"))?
                .to_bundle(),
            None => SourceBundle::new(
                read_optional(self.html.as_deref())?,
                read_optional(self.css.as_deref())?,
                read_optional(self.js.as_deref())?,
            ),
        };
        bundle.external_resources.extend(self.resources());
        Ok(bundle)
    }
}

fn init_logging() -> Result<()> {
    // Log to file (~/.livepreview/logs/livepreview.log); stdout carries console output
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn backend(config: &Config) -> Arc<dyn BoundaryBackend> {
    let backend = ProcessBoundary::new(config.runtime.clone());
    if !backend.is_available() {
        eprintln!(
            "warning: preview runtime '{}' not found; previews will report a load failure",
            config.runtime.program.display()
        );
    }
    Arc::new(backend)
}

/// Load once and print until the boundary exits, the timeout passes, or Ctrl-C
async fn run_once(config: Config, sources: SourceArgs, timeout: Duration) -> Result<()> {
    let bundle = sources.load(&config)?;

    let gate = GenerationGate::new();
    let (relay_tx, relay_rx) = mpsc::channel(1024);
    let relay = tokio::spawn(
        MessageRelay::new(gate.clone(), ConsolePrinter::new(std::io::stdout())).run(relay_rx),
    );

    let mut engine = PreviewEngine::new(backend(&config), gate, relay_tx);
    engine.soft_reload(&bundle).await;

    tokio::select! {
        _ = engine.wait_for_exit() => {}
        _ = tokio::time::sleep(timeout) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    engine.teardown().await;
    drop(engine);

    relay.await.context("Message relay failed")?;
    Ok(())
}

async fn watch(config: Config, sources: SourceArgs) -> Result<()> {
    let bundle = sources.load(&config)?;

    let files: Vec<(SourceKind, PathBuf)> = [
        (SourceKind::Markup, &sources.html),
        (SourceKind::Style, &sources.css),
        (SourceKind::Script, &sources.js),
    ]
    .into_iter()
    .filter_map(|(kind, path)| path.clone().map(|path| (kind, path)))
    .collect();
    let mut watcher = SourceWatcher::new(files).context("Failed to watch source files")?;

    let surface = PreviewSurface::spawn(
        backend(&config),
        bundle,
        config.quiet_period,
        ConsolePrinter::new(std::io::stdout()).with_clear_markers(),
    );
    eprintln!("watching; enter r to refresh, R to hard refresh, q to quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            change = watcher.next_change() => match change {
                Some(change) => surface.edit(change).await?,
                None => break,
            },
            line = stdin.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    Some("r") => surface.refresh().await?,
                    Some("R") => surface.hard_refresh().await?,
                    Some("q") => break,
                    Some(_) => {}
                    // Detached stdin: keep watching files until Ctrl-C
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    surface.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());
    init_logging()?;

    let config = Config::load()?;

    match cli.command {
        Command::Synth(sources) => {
            let bundle = sources.load(&config)?;
            print!("{}", synthesize(&bundle));
        }
        Command::Run {
            sources,
            timeout_ms,
        } => run_once(config, sources, Duration::from_millis(timeout_ms)).await?,
        Command::Watch {
            sources,
            debounce_ms,
        } => {
            let config = match debounce_ms {
                Some(ms) => config.with_quiet_period(Duration::from_millis(ms)),
                None => config,
            };
            watch(config, sources).await?
        }
        Command::Save { sources, title } => {
            let bundle = sources.load(&config)?;
            let mut snippet = Snippet::from_bundle(&bundle);
            if let Some(title) = title {
                snippet = snippet.with_title(title);
            }
            let id = FileSnippetStore::new(&config.snippets_dir).save(&mut snippet)?;
            println!("{id}");
        }
    }

    Ok(())
}
