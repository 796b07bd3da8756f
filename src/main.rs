//! Slidedeck command line viewer.
//!
//! # Usage
//!
//! ```bash
//! # List the slides of the bundled deck
//! slidedeck outline
//!
//! # Export a deck to PDF in ./out
//! slidedeck --deck talk.json export --out-dir out
//!
//! # Render one slide to PNG
//! slidedeck capture --slide 3 --out slide3.png
//!
//! # Drive the viewer from stdin: right, left, space, f, e, q
//! slidedeck present
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use slidedeck::platform::MemoryNotifier;
use slidedeck::{
    Deck, ExportStatus, FullscreenChange, KeyEvent, PageFormat, Platform, Viewer, ViewerConfig,
    VisibilityPolicy,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Slide deck viewer with PDF export
#[derive(Parser, Debug)]
#[command(name = "slidedeck")]
#[command(version)]
struct Args {
    /// Deck JSON file (defaults to the bundled deck)
    #[arg(long, global = true)]
    deck: Option<PathBuf>,

    /// Directory relative image paths resolve against (defaults to the deck's directory)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the slide list
    Outline,
    /// Interactive key loop on stdin
    Present {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Render one slide (1-based) to a PNG file
    Capture {
        #[arg(long)]
        slide: usize,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
    },
    /// Export the whole deck to PDF
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Overrides the deck's file name
        #[arg(long)]
        file_name: Option<String>,
        /// all-slides or one-at-a-time
        #[arg(long, default_value = "all-slides")]
        policy: VisibilityPolicy,
        #[arg(long, default_value = "a4")]
        format: PageFormat,
        #[arg(long, default_value_t = 800)]
        settle_ms: u64,
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
    },
}

fn load_deck(args: &Args) -> anyhow::Result<(Deck, PathBuf)> {
    match &args.deck {
        Some(path) => {
            let deck = Deck::from_path(path)
                .with_context(|| format!("loading deck {}", path.display()))?;
            let root = args.assets.clone().unwrap_or_else(|| {
                path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
            });
            Ok((deck, root))
        }
        None => Ok((
            Deck::builtin()?,
            args.assets.clone().unwrap_or_else(|| PathBuf::from(".")),
        )),
    }
}

fn build_viewer(deck: Deck, config: ViewerConfig) -> anyhow::Result<(Viewer, Arc<MemoryNotifier>)> {
    let notices = Arc::new(MemoryNotifier::new());
    let platform = Platform::headless(&config)?.with_notifier(notices.clone());
    let viewer = Viewer::new(deck, config, platform)?;
    Ok((viewer, notices))
}

fn print_notices(notices: &MemoryNotifier) {
    for notice in notices.take() {
        eprintln!("[{:?}] {}", notice.level, notice.message);
    }
}

fn print_bar(viewer: &Viewer) {
    let bar = viewer.control_bar();
    let slide = viewer.current_slide();
    println!(
        "{}  {}{}",
        bar.position,
        slide.display_title(),
        if viewer.is_fullscreen() { "  [fullscreen]" } else { "" }
    );
}

async fn export(viewer: &Viewer, notices: &MemoryNotifier) -> anyhow::Result<()> {
    match viewer.export_deck().await {
        ExportStatus::Completed(report) => {
            println!("wrote {} ({} pages)", report.path.display(), report.pages);
            Ok(())
        }
        ExportStatus::Failed(e) => {
            print_notices(notices);
            Err(e.into())
        }
        ExportStatus::AlreadyRunning => bail!("an export is already running"),
    }
}

async fn present(viewer: &Viewer, notices: &MemoryNotifier) -> anyhow::Result<()> {
    print_bar(viewer);
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let key = match line.trim() {
            "" => continue,
            "q" | "quit" => break,
            "right" => KeyEvent::press("ArrowRight"),
            "left" => KeyEvent::press("ArrowLeft"),
            "space" => KeyEvent::new(" ", "Space"),
            "f" => {
                if let FullscreenChange::Denied(msg) = viewer.toggle_fullscreen().await {
                    eprintln!("{}", msg);
                }
                print_bar(viewer);
                continue;
            }
            "e" => {
                if !viewer.control_bar().export_visible {
                    eprintln!("export is not available in fullscreen");
                } else if let Err(e) = export(viewer, notices).await {
                    eprintln!("{:#}", e);
                }
                continue;
            }
            other => {
                eprintln!("unknown input '{}'", other);
                continue;
            }
        };
        viewer.handle_key(&key);
        print_bar(viewer);
        io::stdout().flush()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let (deck, asset_root) = load_deck(&args)?;

    match args.command {
        Command::Outline => {
            println!("{} ({} slides)", deck.title(), deck.len());
            for (i, slide) in deck.slides().iter().enumerate() {
                println!("{:>3}. [{:?}/{:?}] {}", i + 1, slide.kind, slide.layout(), slide.display_title());
            }
        }
        Command::Present { out_dir } => {
            let config = ViewerConfig { asset_root, download_dir: out_dir, ..Default::default() };
            let (viewer, notices) = build_viewer(deck, config)?;
            present(&viewer, &notices).await?;
        }
        Command::Capture { slide, out, scale } => {
            if slide == 0 || slide > deck.len() {
                bail!("slide must be between 1 and {}", deck.len());
            }
            let config = ViewerConfig { asset_root, capture_scale: scale, ..Default::default() };
            let (viewer, _notices) = build_viewer(deck, config)?;
            for _ in 1..slide {
                viewer.navigate(slidedeck::NavCommand::Next);
            }
            let bitmap = viewer.capture_current().await?;
            std::fs::write(&out, bitmap.to_png()?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} ({}x{})", out.display(), bitmap.width(), bitmap.height());
        }
        Command::Export { out_dir, file_name, policy, format, settle_ms, scale } => {
            let config = ViewerConfig {
                asset_root,
                download_dir: out_dir,
                export_file_name: file_name,
                visibility_policy: policy,
                page_format: format,
                settle_delay_ms: settle_ms,
                capture_scale: scale,
                ..Default::default()
            };
            let (viewer, notices) = build_viewer(deck, config)?;
            export(&viewer, &notices).await?;
        }
    }

    Ok(())
}
