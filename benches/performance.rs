use leveled_logger::config::SinkConfig;
use leveled_logger::{Logger, Severity};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BENCH_DIR: &str = "target/bench_outputs";
const BENCH_NAME: &str = "bench";

fn sink_configs(name: &str) -> Vec<(String, Vec<SinkConfig>)> {
    let dir = Path::new(BENCH_DIR);
    let file = dir.join(format!("{name}.log"));
    let mut configs = vec![(
        "file".to_string(),
        vec![SinkConfig::file(file.to_string_lossy())],
    )];

    #[cfg(feature = "sqlite")]
    {
        let db = dir.join(format!("{name}.db"));
        configs.push((
            "sqlite".to_string(),
            vec![SinkConfig::database(format!(
                "sqlite://{}",
                db.to_string_lossy()
            ))],
        ));
    }

    configs
}

fn cleanup(name: &str) {
    for ext in ["log", "db"] {
        let _ = fs::remove_file(PathBuf::from(BENCH_DIR).join(format!("{name}.{ext}")));
    }
}

fn run_benchmark(label: &str, sinks: &[SinkConfig], events: usize, runs: usize) -> (Duration, Duration) {
    println!("\n{:=<60}", "=");
    println!("Benchmark: {label} ({events} events)");
    println!("{:=<60}", "=");

    let mut times = Vec::new();

    for run in 1..=runs {
        cleanup(BENCH_NAME);

        let mut logger = Logger::new(sinks, Severity::Debug).expect("Failed to build logger");

        let start = Instant::now();
        for i in 0..events {
            let severity = Severity::ALL[i % Severity::ALL.len()];
            logger.log(severity, "benchmark message with a moderately long payload");
        }
        let elapsed = start.elapsed();

        println!("  Run {run}/{runs}: {:.3}s", elapsed.as_secs_f64());
        times.push(elapsed);
    }

    cleanup(BENCH_NAME);

    let total: Duration = times.iter().sum();
    let avg = total / u32::try_from(times.len()).unwrap_or(1);
    let min = times.iter().min().copied().unwrap_or_default();

    #[allow(clippy::cast_precision_loss)]
    let throughput = events as f64 / avg.as_secs_f64();
    println!("\n  Average: {:.3}s", avg.as_secs_f64());
    println!("  Min:     {:.3}s", min.as_secs_f64());
    println!("  Rate:    {throughput:.0} events/s");

    (avg, min)
}

fn main() {
    println!("\n{:=^60}", " lvlog Performance Benchmark ");
    fs::create_dir_all(BENCH_DIR).expect("Failed to create bench dir");

    let runs = 3;
    let mut results = Vec::new();

    for (label, sinks) in sink_configs(BENCH_NAME) {
        // 数据库每条日志两次插入 + 一次提交，事件数少一些
        let events = if label == "file" { 20_000 } else { 2_000 };
        let (avg, min) = run_benchmark(&label, &sinks, events, runs);
        results.push((label, events, avg, min));
    }

    println!("\n{:=^60}", " Summary ");
    println!(
        "\n{:<12} {:>10} {:>12} {:>12}",
        "Sink", "Events", "Avg (s)", "Min (s)"
    );
    println!("{:-<60}", "");
    for (label, events, avg, min) in &results {
        println!(
            "{:<12} {:>10} {:>12.3} {:>12.3}",
            label,
            events,
            avg.as_secs_f64(),
            min.as_secs_f64()
        );
    }
}
