//! credvault-analyze: runs one password analysis over the local vault and prints a summary.
//!
//! Settings come from `$CREDVAULT_CONFIG` or the platform config dir. Passwords are never
//! printed; weak and reused passwords are reported by the entry that holds them.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use credvault::database::Database;
use credvault::managers::vault_manager::VaultManager;
use credvault::services::key_provider::FileKeyProvider;
use credvault::services::password_analysis::PasswordAnalysis;
use credvault::services::quality_gates::QualityGateEngine;
use credvault::services::record_cipher::RecordCipher;
use credvault::services::record_serializer::RecordSerializer;
use credvault::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use credvault::types::analysis::AnalysisReport;

fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("passwords analysed: {}", report.passwords.len());
    println!(
        "quality gates:      {} enabled, weak at {} or fewer passed",
        report.total_gates, report.required_gates
    );
    println!("average score:      {:.2}", report.average_score);

    println!("weak passwords:     {}", report.weak.len());
    for password in &report.weak {
        println!(
            "  {} ({}/{} gates)",
            password.entry.name, password.score, report.total_gates
        );
    }

    println!("reused passwords:   {}", report.duplicates.len());
    for group in &report.duplicates {
        let entries: Vec<&str> = group.members.iter().map(|m| m.entry.name.as_str()).collect();
        println!("  shared by {}: {}", group.len(), entries.join(", "));
    }

    if !report.failures.is_empty() {
        println!("unreadable records: {}", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.record, failure.reason);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut settings_engine = SettingsEngine::new(None);
    let settings = settings_engine.load()?;
    init_tracing(&settings.logging.filter);

    let database_path = Path::new(&settings.storage.database_path);
    ensure_parent(database_path)?;
    let db = Arc::new(Database::open(database_path)?);

    let cipher = RecordCipher::new(FileKeyProvider::new(&settings.storage.key_path));
    let serializer = Arc::new(RecordSerializer::new(Arc::new(cipher)));
    let vault = Arc::new(VaultManager::new(db, Arc::clone(&serializer)));

    let gates = Arc::new(QualityGateEngine::new());
    gates.load(&settings.gates.path)?;

    let analysis = PasswordAnalysis::new(vault, serializer, gates, settings.analysis.clone());
    let report = analysis.run().await?;
    print_report(&report);
    Ok(())
}
