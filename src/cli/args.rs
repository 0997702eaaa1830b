use clap::{Parser, Subcommand, ValueEnum};

use crate::common::config::Tier;
use crate::scanner::targets::Category;

/// SpaceSweep: find and safely remove reclaimable disk space
#[derive(Parser, Debug)]
#[command(
    name = "spacesweep",
    version,
    about = "Find and safely remove caches, logs, stale downloads and trash",
    long_about = "SpaceSweep measures caches, logs, downloads and trash under your home\n\
                   directory and removes them without touching protected system paths.",
    after_help = "EXAMPLES:\n  \
        spacesweep scan                             Aggregate totals per category\n  \
        spacesweep scan --tier full --detailed      List the largest items\n  \
        spacesweep scan --categories cache,logs     Scan a subset\n  \
        spacesweep clean --dry-run                  Preview what would be removed\n  \
        spacesweep clean --categories trash --yes   Empty the trash without asking\n  \
        spacesweep info --format json               Machine and disk details\n  \
        spacesweep config show                      Print the active configuration"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, no progress or decoration
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure reclaimable space
    Scan {
        /// Scan tier
        #[arg(long, default_value = "restricted")]
        tier: TierArg,

        /// Only scan specific categories
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<CategoryArg>>,

        /// Show individual items in results
        #[arg(long)]
        detailed: bool,
    },

    /// Remove deletable items found by a full scan
    Clean {
        /// Simulate, nothing is deleted
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Only clean specific categories
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<CategoryArg>>,
    },

    /// Show machine and disk information
    Info,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Print the config file location
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierArg {
    Restricted,
    Full,
}

impl From<TierArg> for Tier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Restricted => Tier::Restricted,
            TierArg::Full => Tier::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Cache,
    Logs,
    Downloads,
    Trash,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Cache => Category::Cache,
            CategoryArg::Logs => Category::Logs,
            CategoryArg::Downloads => Category::Downloads,
            CategoryArg::Trash => Category::Trash,
        }
    }
}

/// Convert an optional category filter, dropping duplicates
pub fn category_filter(args: Option<&[CategoryArg]>) -> Option<Vec<Category>> {
    args.map(|args| {
        let mut categories: Vec<Category> = args.iter().copied().map(Category::from).collect();
        categories.sort();
        categories.dedup();
        categories
    })
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
