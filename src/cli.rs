use clap::{Args, Parser, Subcommand};
use panel_cost_estimator::pricing::MaterialGrade;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cost-estimator", version, about = "Composite panel cost estimator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the estimator server (default)
    Start,

    /// Test configuration file validity
    Test,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Apply database migrations
    Migrate,

    /// Replace reference data with the baseline suppliers, rates and panels
    Seed,

    /// Create an estimate and print its report
    Estimate(EstimateArgs),

    /// Print the report of a stored estimate
    Report {
        /// Estimate id
        id: String,
    },

    /// Planning calculators that need no database
    Analyze {
        #[command(subcommand)]
        action: AnalyzeCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,
}

#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    /// Number of panels
    #[arg(short, long)]
    pub quantity: i64,

    /// Panel size name, e.g. 500x500
    #[arg(short, long)]
    pub panel_size: String,

    /// Material grade
    #[arg(short, long, default_value = "standard", value_parser = parse_grade)]
    pub grade: MaterialGrade,

    /// Supplier id
    #[arg(short, long)]
    pub supplier: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnalyzeCommands {
    /// Processing hours for an order
    ProcessingTime {
        /// Panel area in m²
        #[arg(long)]
        area: f64,
        #[arg(long)]
        quantity: u32,
    },

    /// Quality-control cost for a total (low, medium, high complexity)
    QcCost {
        #[arg(long)]
        total: f64,
        #[arg(long, default_value = "medium")]
        complexity: String,
    },

    /// Return on investment in percent
    Roi {
        #[arg(long)]
        total: f64,
        /// Expected lifespan in years
        #[arg(long)]
        lifespan: f64,
        /// Annual energy savings
        #[arg(long)]
        savings: f64,
        /// Annual maintenance cost
        #[arg(long, default_value = "0")]
        maintenance: f64,
    },
}

fn parse_grade(value: &str) -> Result<MaterialGrade, String> {
    value.parse().map_err(|e: panel_cost_estimator::error::AppError| e.to_string())
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}
