use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

use proposal_review::audit::{verify_audit_chain, AuditLogEntry};
use proposal_review::database::queries::Queries;
use proposal_review::database::Database;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("verify-audit-log")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Verify the integrity of the legal audit log hash chain")
        .arg(
            Arg::new("database-url")
                .short('d')
                .long("database-url")
                .value_name("URL")
                .help("SQLite database URL")
                .default_value("sqlite://proposal-review.db"),
        )
        .arg(
            Arg::new("resource")
                .short('r')
                .long("resource")
                .value_name("ID")
                .help("Only list entries for this proposal after verifying"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable verbose output"),
        )
        .get_matches();

    let database_url = matches
        .get_one::<String>("database-url")
        .ok_or_else(|| anyhow!("--database-url is required"))?;
    let resource = matches.get_one::<String>("resource");
    let verbose = matches.get_flag("verbose");

    tracing_subscriber::fmt()
        .with_max_level(if verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    if let Err(e) = verify(database_url, resource.map(String::as_str), verbose).await {
        error!("Audit log verification failed: {}", e);
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }

    println!("✓ Audit log verification completed successfully");
    Ok(())
}

async fn verify(database_url: &str, resource: Option<&str>, verbose: bool) -> Result<()> {
    info!("Verifying audit log in {}", database_url);

    let database = Database::open_read_only(database_url)
        .await
        .map_err(|e| anyhow!("Cannot open {}: {}", database_url, e))?;
    let records = Queries::list_audit_records(database.pool()).await?;
    let report = verify_audit_chain(&records)?;

    if verbose {
        println!("Entries: {}", report.entry_count);
        println!("Head hash: {}", report.head_hash);
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            println!("First entry: {}", first.created_at);
            println!("Last entry: {}", last.created_at);
        }
    }

    if let Some(resource_id) = resource {
        let entries = Queries::list_audit_records_for_resource(database.pool(), resource_id).await?;
        println!("\n{} entries for {}:", entries.len(), resource_id);
        for record in &entries {
            println!("  {}", AuditLogEntry::from_record(record).summary());
        }
    }

    Ok(())
}
