use std::path::Path;

use uptime_monitor::error::{Error, Result};
use uptime_monitor::models::{NewTarget, TargetId};
use uptime_monitor::storage::{SqliteTargetStore, TargetStore};

fn open(db_path: &Path) -> Result<SqliteTargetStore> {
    SqliteTargetStore::new(db_path).map_err(|e| {
        Error::with_source(
            format!("Failed to open target store at {}", db_path.display()),
            e,
        )
    })
}

/// Register a new target
pub fn add_target(db_path: &Path, url: &str, interval_seconds: u64, enabled: bool) -> Result<()> {
    let target = NewTarget::new(url, interval_seconds, enabled)?;
    let store = open(db_path)?;
    let id = store.insert_target(&target)?;

    println!(
        "Added target {id}: {} (every {}s, {})",
        target.url(),
        target.interval_seconds(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Print every target with its latest check
pub fn list_targets(db_path: &Path) -> Result<()> {
    let store = open(db_path)?;
    let statuses = store.latest_check_per_target()?;

    if statuses.is_empty() {
        println!("No targets registered.");
        return Ok(());
    }

    println!(
        "{:<6} {:<9} {:<8} {:<6} {:<10} URL",
        "ID", "INTERVAL", "ENABLED", "OK", "LATENCY"
    );
    println!("{:-<80}", "");

    for status in &statuses {
        let target = &status.target;
        let (ok, latency) = match &status.last_check {
            Some(check) => (
                check.ok.to_string(),
                check
                    .latency_ms
                    .map(|ms| format!("{ms:.1}ms"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            None => ("-".to_string(), "-".to_string()),
        };

        println!(
            "{:<6} {:<9} {:<8} {:<6} {:<10} {}",
            target.id,
            format!("{}s", target.interval_seconds),
            target.enabled,
            ok,
            latency,
            target.url
        );
    }

    println!("\nTotal: {} target(s)", statuses.len());
    Ok(())
}

/// Delete a target; its check history is kept
pub fn remove_target(db_path: &Path, id: TargetId) -> Result<()> {
    let store = open(db_path)?;

    if !store.delete_target(id)? {
        return Err(Error::other(format!("Target {id} not found")));
    }

    println!("Removed target {id}");
    Ok(())
}
