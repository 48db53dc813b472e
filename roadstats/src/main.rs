//! Roadstats CLI - road length per country, from SQLite to JSON
//!
//! ```bash
//! roadstats report statistics.sqlite                 # writes road_data.json
//! roadstats report statistics.sqlite -o -            # report on stdout
//! roadstats report statistics.sqlite --lenient       # drop unparsable values
//! roadstats classes statistics.sqlite                # show derived road classes
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG` (e.g. `RUST_LOG=roadstats=debug`)
//! to change verbosity.

use clap::{Args, Parser, Subcommand};
use roadstats::{
    list_classes, run, DuplicatePolicy, OutputTarget, ParsePolicy, ReportConfig, SourceConfig,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "roadstats")]
#[command(about = "Build a per-country road length report from a statistics database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Statistics SQLite file (default: $ROADSTATS_DATABASE)
    database: Option<PathBuf>,

    /// Table with one row per country
    #[arg(short, long)]
    table: Option<String>,

    /// Country code column, first column of the table
    #[arg(short, long)]
    key_column: Option<String>,
}

impl SourceArgs {
    fn apply(self, source: &mut SourceConfig) {
        if let Some(db) = self.database {
            source.database = Some(db);
        }
        if let Some(table) = self.table {
            source.table = table;
        }
        if let Some(key) = self.key_column {
            source.key_column = key;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write the JSON report
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file, `-` for stdout (default: road_data.json)
        #[arg(short, long)]
        output: Option<String>,

        /// Skip values that are not numbers instead of failing
        #[arg(long)]
        lenient: bool,

        /// Fail when a country code appears twice (default: last row wins)
        #[arg(long)]
        reject_duplicates: bool,
    },

    /// Show the road classes derived from the table columns
    Classes {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            source,
            output,
            lenient,
            reject_duplicates,
        } => cmd_report(source, output, lenient, reject_duplicates),

        Commands::Classes { source } => cmd_classes(source),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_report(
    source: SourceArgs,
    output: Option<String>,
    lenient: bool,
    reject_duplicates: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ReportConfig::from_env()?;
    source.apply(&mut config.source);
    if let Some(out) = output {
        config.output = OutputTarget::parse(&out);
    }
    if lenient {
        config.parse_policy = ParsePolicy::Lenient;
    }
    if reject_duplicates {
        config.duplicate_policy = DuplicatePolicy::Reject;
    }

    let summary = run(&config)?;

    eprintln!("📊 Road classes: {}", summary.classes.classes().join(", "));
    eprintln!("   Countries: {}", summary.countries);
    if summary.skipped_rows > 0 {
        eprintln!("   Rows without country code: {}", summary.skipped_rows);
    }
    if summary.duplicates > 0 {
        eprintln!("   ⚠️  Duplicate codes collapsed: {}", summary.duplicates);
    }
    if !summary.degradations.is_empty() {
        eprintln!("   ⚠️  Unparsable values dropped: {}", summary.degradations.len());
        for d in summary.degradations.iter().take(5) {
            eprintln!(
                "     - row {} ({}), column '{}': '{}'",
                d.row,
                d.country,
                d.column.as_deref().unwrap_or("?"),
                d.value
            );
        }
    }
    eprintln!("💾 Output written to: {}", summary.output);

    Ok(())
}

fn cmd_classes(source: SourceArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ReportConfig::from_env()?;
    source.apply(&mut config.source);

    let labels = list_classes(&config.source)?;
    println!("{}", serde_json::to_string_pretty(&labels)?);
    Ok(())
}
