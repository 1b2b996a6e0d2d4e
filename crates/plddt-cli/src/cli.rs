use clap::{Args, Parser, Subcommand};
use plddtpaint::core::confidence::BoundaryRule;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "pLDDT Paint Developers",
    version,
    about = "pLDDT Paint CLI - Color predicted structures by per-residue confidence and flag catalytic residues.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a coloring pass over an exported atom table and print the bin summary.
    Color(ColorArgs),
    /// Classify raw confidence scores without a scene.
    Classify(ClassifyArgs),
}

/// Arguments for the `color` subcommand.
#[derive(Args, Debug)]
pub struct ColorArgs {
    /// Path to the atom table (CSV with object,chain,resi,resn,name,b,q columns).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub atoms: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scope expression to color (e.g., 'all', 'chain A', an object name).
    #[arg(short, long, value_name = "EXPR")]
    pub scope: Option<String>,

    /// Marker value above which a residue counts as catalytic.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Which side of each threshold is inclusive.
    #[arg(long, value_name = "RULE")]
    pub rule: Option<BoundaryRule>,

    /// Also draw a charge-colored transparent surface with an opaque catalytic patch.
    #[arg(long)]
    pub surface: bool,

    /// Do not draw spheres on catalytic residues.
    #[arg(long)]
    pub no_spheres: bool,

    /// Write the host commands issued by the pass to this file.
    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S catalytic.cutoff=7.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `classify` subcommand.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Confidence scores to classify.
    #[arg(required = true, value_name = "SCORE", allow_negative_numbers = true)]
    pub scores: Vec<f64>,

    /// Marker value to test against the catalytic cutoff.
    #[arg(short, long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub marker: Option<f64>,

    /// Marker cutoff.
    #[arg(long, value_name = "FLOAT", default_value_t = plddtpaint::core::confidence::DEFAULT_CATALYTIC_CUTOFF)]
    pub cutoff: f64,

    /// Which side of each threshold is inclusive.
    #[arg(long, value_name = "RULE", default_value_t = BoundaryRule::default())]
    pub rule: BoundaryRule,
}
