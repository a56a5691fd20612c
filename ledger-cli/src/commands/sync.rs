//! Replay queued mutations and refresh the cache.

use anyhow::Result;
use ledger_client::{HttpTransport, SyncService};
use std::sync::Arc;

/// Run the sync command.
pub async fn run<T: HttpTransport + 'static>(service: &Arc<SyncService<T>>) -> Result<()> {
    service.set_connectivity(true).await;
    let report = service.run_sync_pass().await?;

    println!("Sync pass complete:");
    println!("  Delivered:   {}", report.synced);
    if report.requeued > 0 {
        println!("  Requeued:    {}", report.requeued);
    }
    if report.dropped > 0 {
        println!("  Dropped:     {}", report.dropped);
    }
    if report.dead_lettered > 0 {
        println!("  Dead-letter: {}", report.dead_lettered);
    }
    println!("  Still queued: {}", service.pending_count().await);
    Ok(())
}
