use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trendlens::filter::{Selection, Selections};
use trendlens::format::truncate_label;
use trendlens::report::Dashboard;
use trendlens::DashboardConfig;

#[derive(Parser, Debug)]
#[command(name = "trendlens")]
#[command(author, version, about = "Explore macro-trends, micro-trends and influencers in social media data")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Spreadsheet to analyze, .xlsx or .csv (optional in GUI mode)
    path: Option<PathBuf>,

    /// Launch GUI file picker (auto-enabled when double-clicked)
    #[arg(long)]
    gui: bool,

    /// Only include these macro-trends (repeatable)
    #[arg(long = "macro", value_name = "NAME")]
    macro_trends: Vec<String>,

    /// Only include these micro-trends (repeatable)
    #[arg(long = "micro", value_name = "NAME")]
    micro_trends: Vec<String>,

    /// Only include these channels (repeatable)
    #[arg(long = "channel", value_name = "NAME")]
    channels: Vec<String>,

    /// Focus the influencer view on one handle
    #[arg(long)]
    influencer: Option<String>,

    /// Output report file (.html, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for auto-generated reports
    #[arg(long, default_value = "trendlens-reports")]
    report_dir: PathBuf,

    /// Don't auto-generate HTML report
    #[arg(long)]
    no_report: bool,

    /// Don't prompt to open report
    #[arg(long)]
    no_open: bool,

    /// TOML settings file
    #[arg(long, env = "TRENDLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only show summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start interactive dashboard in the browser
    Serve {
        /// Spreadsheet to analyze
        path: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

impl Args {
    fn selections(&self) -> Selections {
        let pick = |values: &[String]| {
            if values.is_empty() {
                Selection::All
            } else {
                Selection::Only(values.to_vec())
            }
        };
        Selections {
            channel: pick(&self.channels),
            macro_trend: pick(&self.macro_trends),
            micro_trend: pick(&self.micro_trends),
            influencer: self.influencer.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let config = match DashboardConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\x1b[31mConfig error:\x1b[0m {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&args, &config);

    // Handle subcommands first
    if let Some(Command::Serve { ref path, port }) = args.command {
        if let Err(e) = trendlens::serve::start(port, path.clone(), config) {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // With GUI feature: launch GUI if --gui flag OR no path provided
    #[cfg(feature = "gui")]
    let use_gui = args.gui || args.path.is_none();

    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    let path = match args.path.clone() {
        Some(p) if !use_gui => p,
        _ => match pick_path(use_gui) {
            Some(p) => p,
            None => std::process::exit(if use_gui { 0 } else { 1 }),
        },
    };

    let table = match trendlens::data::load(&path, &config.data) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("\x1b[31mCould not load {}:\x1b[0m {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let selections = args.selections();
    let source = path.display().to_string();
    let dashboard = Dashboard::build(&table, &source, &selections, &config);

    if !args.quiet {
        print_dashboard(&dashboard, config.limits.bar_label_len);
    }

    eprintln!(
        "\n\x1b[1mDataset:\x1b[0m {} rows kept, {} uncategorized dropped",
        dashboard.dataset.rows, dashboard.dataset.dropped
    );

    // Determine report path
    let report_path = if let Some(ref output) = args.output {
        Some(output.clone())
    } else if !args.no_report {
        if let Err(e) = std::fs::create_dir_all(&args.report_dir) {
            tracing::warn!(dir = %args.report_dir.display(), error = %e, "could not create report dir");
        }
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("trendlens_report_{}.html", timestamp);
        Some(args.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        if let Err(e) = trendlens::report::generate(output_path, &dashboard) {
            eprintln!("Failed to write report: {}", e);
            std::process::exit(1);
        }
        tracing::info!(path = %output_path.display(), "report written");
        if !args.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }

        if !args.no_open {
            if use_gui {
                // In GUI mode, auto-open the report (no prompt)
                if let Err(e) = open::that(output_path) {
                    tracing::warn!(error = %e, "could not open report");
                }
            } else if !args.quiet {
                eprint!("\nOpen report in browser? [Y/n] ");
                io::stderr().flush().ok();

                let mut input = String::new();
                if io::stdin().read_line(&mut input).is_ok() {
                    let input = input.trim().to_lowercase();
                    if input.is_empty() || input == "y" || input == "yes" {
                        if let Err(e) = open::that(output_path) {
                            eprintln!("Failed to open report: {}", e);
                        }
                    }
                }
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured level, or debug with --verbose
fn init_tracing(args: &Args, config: &DashboardConfig) {
    let fallback = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_dashboard(dashboard: &Dashboard, label_len: usize) {
    let trends = &dashboard.trends;
    let influencers = &dashboard.influencers;

    eprintln!("\x1b[1mTrendlens - {}\x1b[0m", dashboard.source);
    eprintln!("{}", "─".repeat(70));

    for kpi in &influencers.kpis {
        eprint!("  \x1b[90m{}\x1b[0m \x1b[1;34m{}\x1b[0m", kpi.label, kpi.display);
    }
    eprintln!();

    eprintln!("\n\x1b[1m{}\x1b[0m", trends.title);
    if trends.macro_cards.is_empty() {
        eprintln!("  \x1b[90m(no data for this selection)\x1b[0m");
    }
    for card in &trends.macro_cards {
        println!("  {:<45} {:>10}", truncate_label(&card.category, 45), card.views_display);
    }
    eprintln!(
        "  Active analysis: {} macro-trends, {} micro-trends, {} videos",
        trends.active.macro_trends, trends.active.micro_trends, trends.active.videos
    );

    eprintln!("\n\x1b[1mTop micro-trends by views\x1b[0m");
    for bar in trends.micro_bars.iter().rev() {
        println!(
            "  {:<45} {:>14.0} {:>5.1}%",
            truncate_label(&bar.category, label_len.min(45)),
            bar.value,
            bar.percent
        );
    }

    eprintln!("\n\x1b[1m{}\x1b[0m", influencers.title);
    for card in &influencers.ranking {
        println!(
            "  {:>2}. {:<30} views {:>8}  followers {:>8}  videos {:>3}",
            card.rank,
            truncate_label(&card.handle, 30),
            card.views,
            card.followers,
            card.videos
        );
    }
}

#[cfg(feature = "gui")]
fn pick_path(use_gui: bool) -> Option<PathBuf> {
    if !use_gui {
        usage();
        return None;
    }
    let picked = rfd::FileDialog::new()
        .set_title("Select a trends spreadsheet")
        .add_filter("Spreadsheets", &trendlens::data::reader::SUPPORTED_EXTENSIONS)
        .pick_file();
    if picked.is_none() {
        eprintln!("No file selected.");
    }
    picked
}

#[cfg(not(feature = "gui"))]
fn pick_path(_use_gui: bool) -> Option<PathBuf> {
    usage();
    eprintln!("Note: GUI mode not available in this build.");
    None
}

fn usage() {
    eprintln!("Usage: trendlens <PATH>");
    eprintln!("Run 'trendlens --help' for more options.");
}
