//! CLI binary for pdf2problems.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SplitConfig` and writes or summarises the problem images.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2problems::{
    split, split_to_dir, PageSelection, ProblemSummary, ProgressCallback, SplitConfig, SplitMode,
    SplitProgressCallback, SplitStats,
};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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

/// Terminal progress: a page bar while rendering, then a region bar while
/// cropping. Regions may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    dropped: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            dropped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}"
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl SplitProgressCallback for CliProgressCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.activate_bar("Rendering", "pages", total_pages);
    }

    fn on_page_rendered(&self, _page_num: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_boundaries_detected(&self, count: usize, fell_back: bool) {
        if fell_back {
            self.bar.println(format!(
                "{} No numbered problems found; using {count} equal sections",
                cyan("⚠"),
            ));
        } else {
            self.bar.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Found {count} problems"))
            ));
        }
        self.activate_bar("Cropping", "regions", count);
    }

    fn on_region_complete(&self, _index: usize, _total: usize, label: &str, kept: bool) {
        if !kept {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            self.bar
                .println(format!("  {} {:<14} {}", dim("·"), label, dim("too thin, dropped")));
        }
        self.bar.inc(1);
    }

    fn on_split_complete(&self, emitted: usize) {
        self.bar.finish_and_clear();
        let dropped = self.dropped.load(Ordering::SeqCst);
        if emitted == 0 {
            eprintln!("{} no problem images produced", red("✘"));
        } else if dropped == 0 {
            eprintln!("{} {} problem images", green("✔"), bold(&emitted.to_string()));
        } else {
            eprintln!(
                "{} {} problem images  {}",
                green("✔"),
                bold(&emitted.to_string()),
                dim(&format!("({dropped} dropped)")),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Detect numbered problems and write one PNG each
  pdf2problems worksheet.pdf -o problems/

  # Summarise what would be produced, as JSON
  pdf2problems --json worksheet.pdf

  # No numbering in the document: split into 8 equal sections
  pdf2problems --mode manual --sections 8 scan.png -o sections/

  # Only pages 2-4, rendered at 2x
  pdf2problems --pages 2-4 --scale 2 worksheet.pdf -o out/

  # From a URL
  pdf2problems https://example.org/hw/week3.pdf -o week3/

OUTPUT:
  Each problem is written as NNN_<label>.png (e.g. 001_problem_1.png) next to
  a manifest.json describing labels, sizes and run statistics.

ENVIRONMENT VARIABLES:
  PDF2PROBLEMS_*          Every flag can be set as PDF2PROBLEMS_<FLAG>
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise searched next to the
                          binary, in the working directory, then system-wide)
  RUST_LOG                Overrides the log filter (e.g. pdf2problems=debug)
"#;

/// Split worksheet PDFs and images into one image per numbered problem.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2problems",
    version,
    about = "Split worksheet PDFs and images into one image per numbered problem",
    long_about = "Split a worksheet (PDF or raster image, local file or URL) into one cropped \
image per numbered problem. Problems are found from lines starting with \"N.\" in the PDF \
text layer; documents without such lines are divided into equal sections.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF/image path or HTTP/HTTPS URL.
    input: String,

    /// Write problem PNGs and manifest.json into this directory.
    #[arg(short, long, env = "PDF2PROBLEMS_OUTPUT")]
    output: Option<PathBuf>,

    /// Segmentation mode.
    #[arg(long, env = "PDF2PROBLEMS_MODE", value_enum, default_value = "auto")]
    mode: ModeArg,

    /// Section count for manual mode (and auto-mode fallback). Non-numeric
    /// or zero values fall back to 5.
    #[arg(long, env = "PDF2PROBLEMS_SECTIONS", default_value = "5")]
    sections: String,

    /// Render scale for PDF pages (0.5–8.0).
    #[arg(long, env = "PDF2PROBLEMS_SCALE", default_value_t = 3.0)]
    scale: f32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2PROBLEMS_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PROBLEMS_PASSWORD")]
    password: Option<String>,

    /// Regions cropped in parallel.
    #[arg(short, long, env = "PDF2PROBLEMS_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Print a JSON summary instead of the human-readable one.
    #[arg(long, env = "PDF2PROBLEMS_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PROBLEMS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PROBLEMS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PROBLEMS_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2PROBLEMS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Auto,
    Manual,
}

/// `--json` payload.
#[derive(Serialize)]
struct JsonSummary<'a> {
    source: &'a str,
    output_dir: Option<String>,
    problems: Vec<ProblemSummary>,
    stats: SplitStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v was given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SplitProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run split ────────────────────────────────────────────────────────
    let (problems, stats) = if let Some(ref dir) = cli.output {
        let stats = split_to_dir(&cli.input, dir, &config)
            .await
            .context("Split failed")?;
        let manifest_path = dir.join("manifest.json");
        let manifest: pdf2problems::Manifest = serde_json::from_slice(
            &std::fs::read(&manifest_path)
                .with_context(|| format!("Failed to read {}", manifest_path.display()))?,
        )
        .context("Failed to parse manifest.json")?;
        (manifest.problems, stats)
    } else {
        let output = split(&cli.input, &config).await.context("Split failed")?;
        let problems = output.problems.iter().map(|p| p.summary()).collect();
        (problems, output.stats)
    };

    if cli.json {
        let summary = JsonSummary {
            source: &cli.input,
            output_dir: cli.output.as_ref().map(|d| d.display().to_string()),
            problems,
            stats: stats.clone(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        print_summary(&cli, &problems, &stats);
    }

    if stats.emitted == 0 {
        anyhow::bail!("No problems found. Try --mode manual");
    }

    Ok(())
}

fn print_summary(cli: &Cli, problems: &[ProblemSummary], stats: &SplitStats) {
    for p in problems {
        let file = p.file.as_deref().unwrap_or("");
        println!(
            "{:<14} {:>5}x{:<5} {}{}",
            p.label,
            p.width,
            p.height,
            if p.cropped { "" } else { "(uncropped) " },
            dim(file),
        );
    }

    let mark = if stats.emitted == 0 {
        red("✘")
    } else if stats.fell_back_to_manual {
        cyan("⚠")
    } else {
        green("✔")
    };
    let dest = cli
        .output
        .as_ref()
        .map(|d| format!("  →  {}", bold(&d.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  {} problems from {} pages  {}ms{}",
        mark, stats.emitted, stats.pages, stats.total_duration_ms, dest,
    );
    if stats.dropped > 0 || stats.uncropped > 0 {
        eprintln!(
            "   {} dropped  /  {} uncropped",
            dim(&stats.dropped.to_string()),
            dim(&stats.uncropped.to_string()),
        );
    }
}

/// Map CLI args to `SplitConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SplitConfig> {
    let pages = parse_pages(&cli.pages)?;
    let sections = match SplitMode::manual_from_input(&cli.sections) {
        SplitMode::Manual(n) => n,
        SplitMode::Auto => pdf2problems::DEFAULT_SECTIONS,
    };
    let mode = match cli.mode {
        ModeArg::Auto => SplitMode::Auto,
        ModeArg::Manual => SplitMode::Manual(sections),
    };

    let mut builder = SplitConfig::builder()
        .mode(mode)
        .fallback_sections(sections)
        .render_scale(cli.scale)
        .pages(pages)
        .download_timeout_secs(cli.download_timeout);

    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
