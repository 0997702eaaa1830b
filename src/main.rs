use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use spacesweep::api::Engine;
use spacesweep::cli::args::{self, CategoryArg, Cli, Commands, ConfigAction, OutputFormat, TierArg};
use spacesweep::cli::output::{self, ScanProgressBar};
use spacesweep::common::config::{Config, Tier};
use spacesweep::common::errors::ConfigError;
use spacesweep::common::format;
use spacesweep::common::system::SystemInfoProbe;
use spacesweep::scanner::targets::ScanItem;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load();
    let log_to_file = config.as_ref().map(|c| c.log_to_file).unwrap_or(false);
    let _log_guard = init_logging(cli.verbose, log_to_file);

    match cli.command {
        Commands::Scan {
            tier,
            ref categories,
            detailed,
        } => cmd_scan(&cli, config?, tier, categories.as_deref(), detailed),

        Commands::Clean {
            dry_run,
            yes,
            ref categories,
        } => cmd_clean(&cli, config?, dry_run, yes, categories.as_deref()),

        Commands::Info => cmd_info(&cli),

        Commands::Config { ref action } => cmd_config(action, config),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                args::CompletionShell::Bash => clap_complete::Shell::Bash,
                args::CompletionShell::Zsh => clap_complete::Shell::Zsh,
                args::CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "spacesweep", &mut std::io::stdout());
            Ok(())
        }
    }
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Log to stderr, plus a daily file under the data dir when enabled.
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: bool, log_to_file: bool) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("spacesweep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file_layer, guard) = if log_to_file {
        let appender = tracing_appender::rolling::daily(Config::logs_dir(), "spacesweep.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(
    cli: &Cli,
    config: Config,
    tier: TierArg,
    categories: Option<&[CategoryArg]>,
    detailed: bool,
) -> Result<()> {
    let engine = Engine::new(config);
    let show_progress = !cli.quiet && cli.format == OutputFormat::Human;

    let bar = ScanProgressBar::new(show_progress);
    let summary = engine.start_scan(tier.into(), args::category_filter(categories), |p| {
        bar.update(p)
    });
    bar.finish();
    let summary = summary?;

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_scan_quiet(&summary),
        OutputFormat::Human => output::print_scan_summary(&summary, detailed),
        OutputFormat::Json => output::print_scan_json(&summary),
        OutputFormat::Quiet => output::print_scan_quiet(&summary),
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(
    cli: &Cli,
    config: Config,
    dry_run: bool,
    yes: bool,
    categories: Option<&[CategoryArg]>,
) -> Result<()> {
    let engine = Engine::new(config);
    let human = cli.format == OutputFormat::Human && !cli.quiet;

    let bar = ScanProgressBar::new(human);
    let summary = engine.start_scan(Tier::Full, args::category_filter(categories), |p| bar.update(p));
    bar.finish();
    let summary = summary?;

    let items: Vec<ScanItem> = summary.items().filter(|i| i.can_delete).cloned().collect();
    let total: u64 = items.iter().map(|i| i.size).sum();

    if human {
        if items.is_empty() {
            println!("  {} Nothing to clean!", "✨");
            return Ok(());
        }
        output::print_scan_summary(&summary, false);
    }

    if !dry_run && !yes && !items.is_empty() && !confirm(items.len(), total)? {
        println!("  {} Cancelled", "✗".red());
        return Ok(());
    }

    let result = engine.clean_items(&items, dry_run);

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_cleanup_quiet(&result),
        OutputFormat::Human => output::print_cleanup_result(&result),
        OutputFormat::Json => output::print_cleanup_json(&result),
        OutputFormat::Quiet => output::print_cleanup_quiet(&result),
    }

    Ok(())
}

fn confirm(count: usize, bytes: u64) -> Result<bool> {
    use std::io::Write;

    print!(
        "\n  {} Permanently delete {} ({})? [y/N] ",
        "❓",
        format::format_count(count),
        format::format_size(bytes)
    );
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

// ─── Info ─────────────────────────────────────────────────────────────────────

fn cmd_info(cli: &Cli) -> Result<()> {
    let probe = SystemInfoProbe;
    let info = probe.system_info();
    let disk = probe.disk_space(&info.home_dir);

    match cli.format {
        OutputFormat::Json => output::print_system_info_json(&info, &disk),
        OutputFormat::Quiet => println!("{}  {}", disk.free, disk.total),
        OutputFormat::Human => output::print_system_info(&info, &disk),
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction, loaded: Result<Config, ConfigError>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = loaded?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("  {} Configuration reset to defaults", "✓".green());
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }
    }
    Ok(())
}
