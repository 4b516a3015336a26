pub mod check;
pub mod fuse;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "nfusion")]
#[command(about = "Fuses overlapping network scan results and flags risk.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Lower output (-q drops decorations, -qq prints only the result line)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// Fold sources one after another instead of in parallel
    #[arg(long, global = true)]
    pub sequential: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fuse scan files and classify the result
    #[command(alias = "f")]
    Fuse(FuseArgs),
    /// Validate a risk policy without reading any scans
    #[command(alias = "c")]
    CheckPolicy { policy: PathBuf },
}

#[derive(Args)]
pub struct FuseArgs {
    /// Scan files (JSON), one per source
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Risk policy (.toml or .json)
    #[arg(short, long)]
    pub policy: Option<PathBuf>,

    /// Write the full report as JSON to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Views to render; all of them when omitted
    #[arg(short = 'V', long = "view", value_enum)]
    pub views: Vec<View>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Summary,
    Detail,
    Ports,
    Services,
    Subnets,
    Findings,
}

impl FuseArgs {
    pub fn shows(&self, view: View) -> bool {
        self.views.is_empty() || self.views.contains(&view)
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
