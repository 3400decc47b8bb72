mod app;
mod config;
mod input;
mod player;
mod playlist;
mod storage;
mod tui;
mod youtube;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tubeline", version, about = "Search YouTube, build a playlist, stream the audio")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui,
    /// Search and print results to stdout (headless).
    Search { query: String },
    /// Resolve a page URL to its audio stream URL (headless).
    Resolve { url: String },
    /// Play a saved playlist file from top to bottom (headless).
    Play { file: PathBuf },

    /// Configure the cookies handed to yt-dlp.
    Auth {
        #[command(subcommand)]
        method: AuthCommand,
    },

    /// Audio output device management (mpv).
    Audio {
        #[command(subcommand)]
        cmd: AudioCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AuthCommand {
    /// Use yt-dlp `--cookies-from-browser`.
    Browser {
        /// Browser name: chrome, firefox, brave, etc.
        browser: String,
    },
    /// Use a Netscape cookies file on disk.
    File { path: PathBuf },
    /// Clear auth settings.
    Clear,
}

#[derive(Debug, Subcommand)]
enum AudioCommand {
    /// List mpv audio devices.
    List,
    /// Set mpv audio device (name as shown in list).
    Set { device: String },
    /// Clear mpv audio device override.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };

    let command = cli.command.unwrap_or(Command::Tui);
    init_logging(&cfg, matches!(command, Command::Tui))?;

    match command {
        Command::Tui => {
            let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
            let mut app = app::App::new(cfg, cfg_path)?;
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Search { query } => {
            let ytdlp = youtube::YtDlp::new(&cfg.ytdlp);
            let results = ytdlp.search(&query).await?;
            for (i, r) in results.iter().enumerate() {
                println!("{:02}. {}  ({})", i + 1, r.title, r.url);
            }
        }
        Command::Resolve { url } => {
            let ytdlp = youtube::YtDlp::new(&cfg.ytdlp);
            let stream = ytdlp.resolve(&url).await?;
            println!("{}", stream.title);
            println!("{}", stream.stream_url);
        }
        Command::Play { file } => {
            app::headless::run_headless(&cfg, &file).await?;
        }
        Command::Auth { method } => {
            let mut cfg = cfg;
            match method {
                AuthCommand::Browser { browser } => {
                    cfg.ytdlp.cookies_from_browser = Some(browser);
                    cfg.ytdlp.cookies = None;
                }
                AuthCommand::File { path } => {
                    if !path.exists() {
                        anyhow::bail!("cookies file not found: {}", path.display());
                    }
                    cfg.ytdlp.cookies = Some(path);
                    cfg.ytdlp.cookies_from_browser = None;
                }
                AuthCommand::Clear => {
                    cfg.ytdlp.cookies = None;
                    cfg.ytdlp.cookies_from_browser = None;
                }
            }
            config::save(&cfg, Some(&cfg_path)).context("save config")?;
            println!("Updated config auth settings.");
        }
        Command::Audio { cmd } => match cmd {
            AudioCommand::List => {
                let out = tokio::process::Command::new(&cfg.player.binary)
                    .args(["--audio-device=help", "--no-video", "--idle=no"])
                    .output()
                    .await
                    .with_context(|| format!("run {} --audio-device=help", cfg.player.binary))?;
                // mpv prints help to stdout.
                print!("{}", String::from_utf8_lossy(&out.stdout));
                eprint!("{}", String::from_utf8_lossy(&out.stderr));
            }
            AudioCommand::Set { device } => {
                let mut cfg = cfg;
                cfg.player.audio_device = Some(device);
                config::save(&cfg, Some(&cfg_path)).context("save config")?;
                println!("Updated audio device in config.");
            }
            AudioCommand::Clear => {
                let mut cfg = cfg;
                cfg.player.audio_device = None;
                config::save(&cfg, Some(&cfg_path)).context("save config")?;
                println!("Cleared audio device override.");
            }
        },
    }

    Ok(())
}

/// The TUI owns the terminal, so it logs to a file in the data dir.
fn init_logging(cfg: &config::Config, to_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if to_file {
        let dir = &cfg.paths.data_dir;
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
        let path = dir.join("tubeline.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}
