//! Hermes SPSC - Transfer Benchmark
//!
//! Satu producer thread mengirim `0..items` lewat ring buffer ke satu
//! consumer thread, lalu hasilnya diverifikasi (urutan dan checksum).
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]
//!   SPSC_CAPACITY=1024 PRODUCER_CPU=0 CONSUMER_CPU=2 cargo run --release

use hermes_spsc::harness::{self, Command, TransferConfig, TransferError, TransferReport};

fn main() {
    hermes_spsc::init_tracing();

    let config = match parse_config() {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            println!("Hermes SPSC - Wait-Free Ring Buffer Transfer Benchmark\n");
            println!("{}", harness::usage());
            return;
        }
        Err(e) => {
            eprintln!("❌ Config error: {}\n", e);
            eprintln!("{}", harness::usage());
            std::process::exit(2);
        }
    };

    println!("🚀 Hermes SPSC - Lock-Free Ring Buffer");
    println!("======================================\n");
    println!(
        "  Capacity: {}  Items/round: {}  Rounds: {}",
        config.capacity, config.items, config.rounds
    );
    if config.producer_cpu.is_some() || config.consumer_cpu.is_some() {
        println!(
            "  Pinning: producer={:?} consumer={:?}",
            config.producer_cpu, config.consumer_cpu
        );
    }
    println!();

    match harness::run_configured(&config) {
        Ok(reports) => {
            for (round, report) in reports.iter().enumerate() {
                print_report(round + 1, report);
            }
            print_summary(&config, &reports);
            println!("\n✅ All rounds verified!");
        }
        Err(e) => {
            eprintln!("❌ Transfer failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_config() -> Result<Command, TransferError> {
    let config = TransferConfig::from_env()?;
    Ok(config.parse_args(std::env::args().skip(1))?)
}

fn print_report(round: usize, report: &TransferReport) {
    println!("📊 Round {}", round);
    println!("  Items:          {}", report.items);
    println!("  Sum:            {} (verified)", report.sum);
    println!(
        "  Elapsed:        {:.3} ms",
        report.elapsed.as_secs_f64() * 1000.0
    );
    println!(
        "  Latency:        {:.2} ns/item ({:.2} M items/sec)",
        report.ns_per_item(),
        report.items_per_sec() / 1_000_000.0
    );
    println!("  Full retries:   {}", report.full_retries);
    println!("  Empty retries:  {}\n", report.empty_retries);
}

fn print_summary(config: &TransferConfig, reports: &[TransferReport]) {
    if reports.len() < 2 {
        return;
    }

    let total_items: u64 = reports.iter().map(|r| r.items).sum();
    let total_secs: f64 = reports.iter().map(|r| r.elapsed.as_secs_f64()).sum();
    let best = reports
        .iter()
        .map(TransferReport::ns_per_item)
        .fold(f64::INFINITY, f64::min);

    println!("📈 Summary ({} rounds, capacity {})", reports.len(), config.capacity);
    println!(
        "  Throughput:     {:.2} M items/sec",
        total_items as f64 / total_secs.max(f64::EPSILON) / 1_000_000.0
    );
    println!("  Best latency:   {:.2} ns/item", best);
}
