use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cleaner::CleanupResult;
use crate::common::config::Tier;
use crate::common::format::{self, format_path, format_size, format_size_colored};
use crate::common::system::{DiskSpace, SystemInfo};
use crate::scanner::targets::{ScanCategory, ScanSummary};
use crate::scanner::ScanProgress;

const DETAIL_LIMIT: usize = 10;

// ─── Scan ─────────────────────────────────────────────────────────────────────

/// Print a scan summary in human-readable format
pub fn print_scan_summary(summary: &ScanSummary, detailed: bool) {
    println!();
    println!("{}  SpaceSweep Scan Results ({} tier)", "🧹", summary.tier);
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} reclaimable  •  {}",
        format::format_millis(summary.scan_time).cyan(),
        format_size_colored(summary.total_space),
        format::format_count(summary.item_count).dimmed()
    );
    if summary.total_disk_space > 0 {
        println!(
            "  Disk: {} free of {}",
            format_size(summary.free_space).green(),
            format_size(summary.total_disk_space)
        );
    }
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if summary.total_space == 0 {
        println!("  {} Nothing to reclaim!", "✨");
        println!();
        return;
    }

    for category in &summary.categories {
        print_category(category, detailed);
    }

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} Total reclaimable: {}",
        "💾",
        format_size_colored(summary.total_space)
    );
    if summary.tier == Tier::Restricted {
        println!(
            "  {} Run {} to see individual items",
            "💡",
            "spacesweep scan --tier full --detailed".cyan()
        );
    } else {
        println!(
            "  {} Run {} to preview a cleanup",
            "💡",
            "spacesweep clean --dry-run".cyan()
        );
    }
    println!();
}

fn print_category(category: &ScanCategory, detailed: bool) {
    let icon = match category.category {
        crate::scanner::targets::Category::Cache => "📁",
        crate::scanner::targets::Category::Logs => "📋",
        crate::scanner::targets::Category::Downloads => "📥",
        crate::scanner::targets::Category::Trash => "🗑️",
    };

    println!(
        "  {} {:<30} {:>10}  ({})",
        icon,
        category.name.bold(),
        format_size(category.size),
        format::format_count(category.item_count).dimmed()
    );

    if !detailed || category.items.is_empty() {
        return;
    }

    for item in category.items.iter().take(DETAIL_LIMIT) {
        println!(
            "      {} {:<48} {:>10}  {}",
            "•".dimmed(),
            format::truncate(&format_path(&item.path), 48),
            format_size(item.size),
            format::format_can_delete(item.can_delete)
        );
    }
    if category.items.len() > DETAIL_LIMIT {
        println!(
            "      {} ... and {} more",
            "•".dimmed(),
            (category.items.len() - DETAIL_LIMIT).to_string().dimmed()
        );
    }
    println!();
}

/// Print a scan summary as JSON
pub fn print_scan_json(summary: &ScanSummary) {
    print_json(summary);
}

/// Print a minimal summary: bytes, items, milliseconds
pub fn print_scan_quiet(summary: &ScanSummary) {
    println!(
        "{}  {}  {}",
        summary.total_space, summary.item_count, summary.scan_time
    );
}

// ─── Clean ────────────────────────────────────────────────────────────────────

/// Print a cleanup outcome in human-readable format
pub fn print_cleanup_result(result: &CleanupResult) {
    println!();
    let (icon, label) = if result.dry_run {
        ("ℹ️", "Dry run")
    } else if result.success {
        ("✓", "Cleaned")
    } else {
        ("⚠", "Cleaned with errors")
    };

    println!(
        "  {} {}: {} of {}, {} {}",
        icon,
        label.bold(),
        result.cleaned.len().to_string().cyan(),
        format::format_count(result.attempted()),
        if result.dry_run { "would free" } else { "freed" },
        format_size_colored(result.total_size_freed),
    );

    if !result.errors.is_empty() {
        println!();
        println!("  {} {} failures:", "⚠".yellow(), result.errors.len());
        for (i, err) in result.errors.iter().enumerate().take(DETAIL_LIMIT) {
            println!(
                "    {} {} {}",
                format!("{}.", i + 1).dimmed(),
                format_path(&err.item.path),
                format!("({})", err.reason).dimmed()
            );
        }
        if result.errors.len() > DETAIL_LIMIT {
            println!(
                "    ... and {} more",
                (result.errors.len() - DETAIL_LIMIT).to_string().dimmed()
            );
        }
    }
    println!();
}

pub fn print_cleanup_json(result: &CleanupResult) {
    print_json(result);
}

/// Print a minimal outcome: bytes freed, cleaned, failed
pub fn print_cleanup_quiet(result: &CleanupResult) {
    println!(
        "{}  {}  {}",
        result.total_size_freed,
        result.cleaned.len(),
        result.failed.len()
    );
}

// ─── Info ─────────────────────────────────────────────────────────────────────

pub fn print_system_info(info: &SystemInfo, disk: &DiskSpace) {
    format::print_header("System");
    format::print_kv("Platform", &info.platform);
    format::print_kv("OS", info.os_version.as_deref().unwrap_or("unknown"));
    format::print_kv("Architecture", &info.arch);
    format::print_kv("Hostname", info.hostname.as_deref().unwrap_or("unknown"));
    format::print_kv("CPU", &format!("{} ({} cores)", info.cpu_brand, info.cpu_count));
    format::print_kv(
        "Memory",
        &format!(
            "{} available of {}",
            format_size(info.available_memory),
            format_size(info.total_memory)
        ),
    );
    format::print_kv("Home", &info.home_dir.display().to_string());
    format::print_kv("Temp", &info.tmp_dir.display().to_string());

    format::print_header("Disk");
    format::print_kv("Total", &format_size(disk.total));
    format::print_kv("Used", &format_size(disk.used()));
    format::print_kv("Free", &format_size_colored(disk.free).to_string());
    println!();
}

pub fn print_system_info_json(info: &SystemInfo, disk: &DiskSpace) {
    print_json(&serde_json::json!({ "system": info, "disk": disk }));
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

// ─── Progress ─────────────────────────────────────────────────────────────────

/// Terminal progress bar driven by scan progress events
pub struct ScanProgressBar {
    pb: Option<ProgressBar>,
}

impl ScanProgressBar {
    pub fn new(show: bool) -> Self {
        let pb = show.then(|| {
            let pb = ProgressBar::new(100);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            {
                pb.set_style(style.progress_chars("━━░"));
            }
            pb.set_message("Starting scan...");
            pb
        });
        Self { pb }
    }

    pub fn update(&self, progress: &ScanProgress) {
        if let Some(ref pb) = self.pb {
            pb.set_position(u64::from(progress.percentage));
            pb.set_message(format!(
                "{} ({} so far)",
                progress.label,
                format::format_count(progress.items_scanned)
            ));
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.pb {
            pb.finish_and_clear();
        }
    }
}
