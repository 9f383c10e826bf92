//! ptop: a terminal resource dashboard over a procfs sampling engine.
//!
//! Run with:  `RUST_LOG=info ptop`

use anyhow::Result;
use ptop_core::Snapshot;
use ptop_metrics::history::format_rate;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("ptop v{} starting", env!("CARGO_PKG_VERSION"));

    let cfg = ptop_config::load(ptop_config::default_path())?;
    let mut snapshots = ptop_metrics::spawn_monitor(cfg);

    while let Some(snapshot) = snapshots.recv().await {
        render(&snapshot);
    }
    Ok(())
}

/// Plain-text stand-in for the widget layer: one summary block per tick.
fn render(snapshot: &Snapshot) {
    let busy = snapshot
        .overall_busy()
        .map_or_else(|| "--".to_string(), |b| format!("{b:.1}%"));

    println!(
        "[{}] cpu {busy}  mem {:.1}%  rx {}  tx {}",
        snapshot.time.format("%H:%M:%S"),
        snapshot.mem.used_percent(),
        format_rate(snapshot.net_rx_rate),
        format_rate(snapshot.net_tx_rate),
    );

    for process in snapshot.processes.iter().take(10) {
        println!(
            "  {:>7} {:<10} {:>5.1} {:>5.1}  r {} w {}  {}",
            process.pid,
            process.user,
            process.cpu_percent,
            process.mem_percent,
            format_rate(process.disk_read_rate),
            format_rate(process.disk_write_rate),
            process.command,
        );
    }
}
