use std::time::Duration;

use uptime_monitor::error::Result;
use uptime_monitor::models::validate_url;
use uptime_monitor::prober::{HttpProber, Probe};

/// Probe one URL and print the outcome
///
/// Returns whether the probe succeeded so the caller can pick an exit code.
pub async fn check(url: &str, timeout_secs: u64, user_agent: &str) -> Result<bool> {
    let url = validate_url(url)?;
    let prober = HttpProber::new(Duration::from_secs(timeout_secs.max(1)), user_agent)?;

    let outcome = prober.probe(&url).await;

    println!("URL:         {url}");
    println!("OK:          {}", outcome.is_ok());
    match outcome.status_code() {
        Some(status) => println!("Status code: {status}"),
        None => println!("Status code: -"),
    }
    println!("Latency:     {:.2} ms", outcome.latency_ms());
    if let Some(error) = outcome.error() {
        println!("Error:       {error}");
    }

    Ok(outcome.is_ok())
}
