//! CLI binary for labelzpl.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig` and `ConversionParameters`, drives a `Session` and writes
//! the results.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use labelzpl::config::{API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use labelzpl::params::RECOMMENDED_DPI;
use labelzpl::{
    default_archive_name, export_archive, export_zpl_to, render_to_pdf, BatchProgressCallback,
    ClientConfig, ColorMode, ConversionClient, ConversionMode, ConversionOutcome,
    ConversionParameters, ConversionParametersBuilder, ProgressCallback, Session, SessionResult,
    SessionState, UploadCandidate, UploadPolicy,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// finished file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the file currently being converted.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_progress(&self, processed: usize, total: usize, current_file: &str) {
        if processed == 0 {
            self.bar.set_length(total as u64);
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting {total} files…"))
            ));
        }
        if processed < total {
            *self.started.lock().unwrap() = Some(Instant::now());
            self.bar.set_message(current_file.to_string());
        } else {
            self.bar.finish_and_clear();
        }
    }

    fn on_file_complete(&self, index: usize, total: usize, outcome: &ConversionOutcome) {
        let secs = self.elapsed_secs();
        match outcome.error_message() {
            None => self.bar.println(format!(
                "  {} {:>3}/{:<3}  {}  {}",
                green("✓"),
                index + 1,
                total,
                outcome.file_name(),
                dim(&format!("{secs:.1}s")),
            )),
            Some(msg) => self.bar.println(format!(
                "  {} {:>3}/{:<3}  {}  {}  {}",
                red("✗"),
                index + 1,
                total,
                outcome.file_name(),
                red(&msg),
                dim(&format!("{secs:.1}s")),
            )),
        }
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One label, ZPL to stdout
  labelzpl shipment.pdf

  # One label to a file, 300 DPI, no rotation
  labelzpl --dpi 300 --rotation 0 shipment.png -o shipment.zpl

  # Several labels, packaged into converted_files_<timestamp>.zip
  labelzpl labels/*.pdf

  # Customs declaration preset (48% scaling, 80% darkness)
  labelzpl --declaration declaration.pdf -o declaration.zpl

  # Render ZPL back to a PDF on the service
  labelzpl --to-pdf shipment.zpl

  # JSON report for scripting
  labelzpl --json labels/*.png > report.json

LIMITS:
  Accepted types: .pdf, .png
  Maximum size:   1 MB per file (override with --max-size-mb)
  Files in a batch are converted one at a time. Ctrl-C stops before the
  next file; unstarted files are reported as cancelled.

ENVIRONMENT VARIABLES:
  LABELZPL_API_KEY   Bearer credential for the conversion service (required)
  LABELZPL_BASE_URL  Service root URL (default http://127.0.0.1:8080/api)
  RUST_LOG           Override log filtering (e.g. labelzpl=debug)
"#;

/// Convert PDF and PNG shipping labels to ZPL.
#[derive(Parser, Debug)]
#[command(
    name = "labelzpl",
    version,
    about = "Convert PDF and PNG shipping labels to ZPL printer commands",
    long_about = "Convert PDF and PNG shipping labels to ZPL printer command text through a \
remote conversion service. One file prints ZPL; several files are converted in order and \
packaged into a ZIP archive with one .txt entry per label.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Label files (.pdf or .png); ZPL text files with --to-pdf.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Write ZPL (one file) or the archive (several files) here.
    #[arg(short, long, env = "LABELZPL_OUTPUT")]
    output: Option<PathBuf>,

    /// Bearer credential for the conversion service.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Conversion service root URL.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "LABELZPL_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Largest accepted file, in MB.
    #[arg(long, env = "LABELZPL_MAX_SIZE_MB", default_value_t = 1.0)]
    max_size_mb: f64,

    /// Printer resolution (203, 300 or 600 recommended).
    #[arg(long, default_value_t = 203)]
    dpi: u32,

    /// Rotation in degrees (0–360).
    #[arg(long, default_value_t = 180,
          value_parser = clap::value_parser!(u32).range(0..=360))]
    rotation: u32,

    /// Scaling percentage (1–200). Default 100.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
    scaling: Option<u32>,

    /// Print darkness percentage (1–100). Default 90.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    darkness: Option<u32>,

    /// Colour mode.
    #[arg(long, value_enum, default_value = "bw")]
    color_mode: ColorArg,

    /// How PDF pages are converted.
    #[arg(long, value_enum, default_value = "image")]
    conversion_mode: ModeArg,

    /// PDF page to convert (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<u32>,

    /// Label width.
    #[arg(long)]
    label_width: Option<f64>,

    /// Label height.
    #[arg(long)]
    label_height: Option<f64>,

    /// ZPL command the service should leave out (repeatable).
    #[arg(long = "ignore-command", value_name = "CMD")]
    ignore_commands: Vec<String>,

    /// Apply the customs declaration preset (48% scaling, 80% darkness, BW).
    #[arg(long)]
    declaration: bool,

    /// Treat inputs as ZPL text and ask the service to render them as PDF.
    #[arg(long)]
    to_pdf: bool,

    /// Print a JSON outcome / batch report instead of ZPL.
    #[arg(long, env = "LABELZPL_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "LABELZPL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LABELZPL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LABELZPL_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ColorArg {
    Bw,
    Grayscale,
}

impl From<ColorArg> for ColorMode {
    fn from(v: ColorArg) -> Self {
        match v {
            ColorArg::Bw => ColorMode::Bw,
            ColorArg::Grayscale => ColorMode::Grayscale,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Image,
    Native,
}

impl From<ModeArg> for ConversionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Image => ConversionMode::Image,
            ModeArg::Native => ConversionMode::Native,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v was given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.to_pdf;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let params = build_params(&cli)?;
    let client = Arc::new(ConversionClient::new(config.clone()).context("Invalid configuration")?);

    // ── Reverse mode ─────────────────────────────────────────────────────
    if cli.to_pdf {
        for path in &cli.files {
            let zpl = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read ZPL from {:?}", path))?;
            let msg = render_to_pdf(&*client, &zpl, Some(&params))
                .await
                .with_context(|| format!("Rendering {} failed", path.display()))?;
            if !cli.quiet {
                eprintln!("{} {}  {}", green("✔"), path.display(), msg);
            }
        }
        return Ok(());
    }

    // ── Select files ─────────────────────────────────────────────────────
    let mut candidates = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        candidates.push(UploadCandidate::from_path(path).await?);
    }

    let mut session = Session::new(client, UploadPolicy::from(&config));
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        session = session.with_progress_callback(cb);
    }
    session.set_params(params);
    if cli.declaration {
        session.set_declaration_mode(true);
    }

    let rejections = session.select_files(candidates);
    if !cli.quiet {
        for r in rejections {
            eprintln!("  {} {}", red("✗"), r);
        }
    }
    if let SessionState::Error(msg) = session.state() {
        anyhow::bail!("No files to convert\n{msg}");
    }

    // Ctrl-C stops the batch before its next file.
    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    // ── Run conversion ───────────────────────────────────────────────────
    let result = session.convert().await.context("Conversion failed")?;

    match result {
        SessionResult::Single(outcome) => {
            if cli.json {
                let json =
                    serde_json::to_string_pretty(outcome).context("Failed to serialise output")?;
                println!("{json}");
            } else if let Some(ref path) = cli.output {
                export_zpl_to(outcome.content(), path)?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {}  →  {}",
                        green("✔"),
                        outcome.file_name(),
                        bold(&path.display().to_string())
                    );
                }
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(outcome.content().as_bytes())
                    .context("Failed to write to stdout")?;
                if !outcome.content().ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
        }
        SessionResult::Batch { report, archive } => {
            let archive = archive
                .as_ref()
                .context("Batch finished without an archive")?;
            let path = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(default_archive_name(Utc::now())));
            export_archive(archive, &path)?;

            if cli.json {
                let json =
                    serde_json::to_string_pretty(report).context("Failed to serialise report")?;
                println!("{json}");
            } else if !cli.quiet {
                if !show_progress {
                    for outcome in &report.outcomes {
                        if let Some(msg) = outcome.error_message() {
                            eprintln!("  {} {}: {}", red("✗"), outcome.file_name(), msg);
                        }
                    }
                }
                let summary = report.summary;
                eprintln!(
                    "{}  {}  {}ms  →  {}",
                    if summary.failed == 0 {
                        green("✔")
                    } else if summary.successful == 0 {
                        red("✘")
                    } else {
                        cyan("⚠")
                    },
                    summary,
                    report.duration_ms,
                    bold(&path.display().to_string()),
                );
            }

            if report.summary.successful == 0 {
                anyhow::bail!("No files were converted");
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .timeout_secs(cli.timeout)
        .max_file_size_mb(cli.max_size_mb);
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    builder.build().context("Invalid configuration")
}

/// Map CLI args to `ConversionParameters`, starting from the form defaults.
fn build_params(cli: &Cli) -> Result<ConversionParameters> {
    if !RECOMMENDED_DPI.contains(&cli.dpi) {
        tracing::warn!(
            "DPI {} is not one of the recommended values {:?}",
            cli.dpi,
            RECOMMENDED_DPI
        );
    }

    let mut builder = ConversionParametersBuilder::from_params(ConversionParameters::standard())
        .dpi(cli.dpi)
        .rotation(cli.rotation)
        .color_mode(cli.color_mode.into())
        .conversion_mode(cli.conversion_mode.into());

    if let Some(scaling) = cli.scaling {
        builder = builder.scaling(scaling);
    }
    if let Some(darkness) = cli.darkness {
        builder = builder.darkness(darkness);
    }
    if let Some(page) = cli.page {
        builder = builder.page_number(page);
    }
    if let Some(width) = cli.label_width {
        builder = builder.label_width(width);
    }
    if let Some(height) = cli.label_height {
        builder = builder.label_height(height);
    }
    for command in &cli.ignore_commands {
        builder = builder.ignore_command(command.clone());
    }

    builder.build().context("Invalid conversion parameters")
}
