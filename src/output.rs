use std::io::{self, Write};

use serde::Serialize;

use crate::acquire::AcquireSummary;
use crate::audit::{AuditCounts, AuditReport};
use crate::catalog::CatalogStats;
use crate::reconcile::{FileClass, PairStatus, SyncReport};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &AcquireSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_sync(result: &SyncReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_audit(result: &AuditReport) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_catalog_stats(stats: &CatalogStats) {
        let rule = "=".repeat(60);
        println!("\n{rule}");
        println!("{:^60}", "Catalog Stats");
        println!("{rule}");
        for listing in &stats.listings {
            println!("{:<36} | {:>10} codes", shorten(&listing.label, 36), listing.unique);
        }
        println!("{}", "-".repeat(60));
        for listing in stats.listings.iter().skip(1) {
            println!(
                "{:<36} | {:>10} overlap, {} new",
                shorten(&listing.label, 36),
                listing.overlap,
                listing.contributed
            );
        }
        println!("{:<36} | {:>10} airlines", "TOTAL COMBINED", stats.combined);
        println!("{rule}\n");
    }

    pub fn print_fetch(result: &AcquireSummary) {
        println!(
            "Processed {} of {} airlines ({} unique)",
            result.completed, result.entities, result.processed
        );
        for source in &result.files {
            println!("{} from {}", source.files, source.name);
        }
    }

    pub fn print_sync(report: &SyncReport) {
        let rule = "-".repeat(60);
        println!("Syncing from {} to {}", report.source_root, report.target_root);
        println!(
            "Dry Run: {}",
            if report.dry_run { "ENABLED" } else { "DISABLED" }
        );
        println!("{rule}");

        for pair in &report.pairs {
            match &pair.status {
                PairStatus::SourceMissing => {
                    println!("Skipping missing source folder: {}", pair.source);
                    continue;
                }
                PairStatus::Failed(reason) => {
                    println!("Error processing {} -> {}: {reason}", pair.source, pair.target);
                    continue;
                }
                PairStatus::TargetCreated => println!("Created target directory: {}", pair.target),
                PairStatus::TargetWouldBeCreated => {
                    println!("Would create target directory: {}", pair.target)
                }
                PairStatus::Synced => {}
            }

            println!("\nProcessing {} -> {}...", pair.source, pair.target);
            for change in &pair.changes {
                match &change.class {
                    FileClass::Added => println!("[NEW] {}/{}", pair.target, change.name),
                    FileClass::Updated { size_delta } => println!(
                        "[UPD] {}/{} (Real Diff: {size_delta:+}B)",
                        pair.target, change.name
                    ),
                    FileClass::Error { reason } => {
                        println!("[ERR] {}/{}: {reason}", pair.source, change.name)
                    }
                    FileClass::Skipped => {}
                }
            }
            if !pair.gaps.is_empty() {
                println!("[GAP] {} file(s) only in {}", pair.gaps.len(), pair.target);
            }
        }

        println!("{rule}");
        println!("Sync Complete.");
        println!("{:<10}{:>8}", "Added:", report.stats.added);
        println!("{:<10}{:>8}", "Updated:", report.stats.updated);
        println!("{:<10}{:>8}", "Skipped:", report.stats.skipped);
        println!("{:<10}{:>8}", "Errors:", report.stats.errors);
    }

    pub fn print_audit(report: &AuditReport) {
        println!("Master List: {} unique ICAO codes.\n", report.catalog_size);
        let header = format!(
            "{:<20} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7}",
            "Provider", "Local", "Repo", "Net", "New", "Gap", "Legy", "Fail"
        );
        println!("{header}");
        println!("{}", "-".repeat(header.len()));
        for provider in &report.providers {
            println!("{}", audit_row(&provider.provider, &provider.counts));
        }
        println!("{}", "-".repeat(header.len()));
        println!("{}", audit_row("TOTAL", &report.totals));
        println!(
            "\nNote: 'Fail' counts catalog airlines missing from that provider's local folder."
        );
    }
}

fn audit_row(name: &str, counts: &AuditCounts) -> String {
    let net = if counts.net == 0 {
        "0".to_string()
    } else {
        format!("{:+}", counts.net)
    };
    format!(
        "{:<20} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7} | {:>7}",
        shorten(name, 20),
        counts.local,
        counts.repo,
        net,
        counts.new,
        counts.gap,
        counts.legacy,
        counts.fail
    )
}

fn shorten(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let tail: String = value
            .chars()
            .rev()
            .take(width.saturating_sub(1))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("…{tail}")
    }
}
