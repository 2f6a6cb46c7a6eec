//! Prints a live memory table until Ctrl-C
//!
//! Set `RUST_LOG=darwin_memwatch=debug` to see every published snapshot in the log.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use darwin_memwatch::prelude::*;
    use futures::StreamExt;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SamplerConfig::from_file(path)?,
        None => SamplerConfig::default(),
    };

    println!("Memory Monitor");
    println!("==============");

    let sampler = MemorySampler::system(config).await?;
    print_snapshot(&sampler.current_snapshot());

    let mut snapshots = Box::pin(sampler.snapshots());
    loop {
        tokio::select! {
            snapshot = snapshots.next() => match snapshot {
                Some(snapshot) => print_snapshot(&snapshot),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sampler.shutdown().await?;
    Ok(())
}

fn print_snapshot(snapshot: &darwin_memwatch::memory::MemorySnapshot) {
    use darwin_memwatch::format::{format_bytes, format_bytes_short, format_bytes_whole, format_count};

    println!(
        "\n#{:<5} {} of {} used ({:.1}%), {} available | pressure {} | swap {} | {}",
        snapshot.sequence,
        format_bytes(snapshot.used_bytes),
        format_bytes_whole(snapshot.total_bytes),
        snapshot.usage_percentage(),
        format_bytes(snapshot.available_bytes),
        snapshot.pressure_level,
        format_bytes_short(snapshot.swap_used_bytes),
        if snapshot.on_ac_power { "AC" } else { "battery" },
    );
    println!(
        "{:<10} | {:<10} | {:<10} | {:<10} | {:<10} | {:<10}",
        "Wired", "Active", "Inactive", "Compressed", "Page ins", "Page outs"
    );
    println!(
        "{:<10} | {:<10} | {:<10} | {:<10} | {:<10} | {:<10}",
        format_bytes_short(snapshot.wired_bytes),
        format_bytes_short(snapshot.active_bytes),
        format_bytes_short(snapshot.inactive_bytes),
        format_bytes_short(snapshot.compressed_bytes),
        format_count(snapshot.page_ins),
        format_count(snapshot.page_outs),
    );
    for process in &snapshot.top_processes {
        println!("  {:>7}  {:<32} {}", process.pid, process.name, format_bytes_short(process.bytes));
    }
}
