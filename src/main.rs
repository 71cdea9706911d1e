//! # chatmood CLI
//!
//! Command-line interface for the chatmood library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chatmood::ChatmoodError;
use chatmood::cli::Args;
use chatmood::config::PipelineConfig;
use chatmood::pipeline::Pipeline;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatmood=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ChatmoodError> {
    let total_start = Instant::now();
    let args = <Args as ClapParser>::parse();
    let config = args.to_config()?;

    println!("🎭 chatmood v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for input in &args.inputs {
        println!("📂 Input:   {}", input.display());
    }
    println!("💾 Export:  {}", config.output.export_path.display());

    if args.extract_only {
        println!("⏭️  Mode:    extract only (no models)");
        println!();
        let report = Pipeline::extract_only(&config, &args.inputs)?;

        println!("✅ Done! {} messages from {} file(s)", report.messages.len(), report.sources.len());
        println!("   Export saved to {}", report.export_path.display());
        return Ok(());
    }

    println!("📊 Charts:  {}", config.output.chart_dir.display());
    println!("🏷️  Topics:  {}", config.topics.join(", "));
    println!();

    run_full(&config, &args, total_start)
}

#[cfg(feature = "candle")]
fn run_full(config: &PipelineConfig, args: &Args, total_start: Instant) -> Result<(), ChatmoodError> {
    println!("⏳ Loading models and classifying...");
    let pipeline = Pipeline::from_config(config.clone())?;
    let report = pipeline.run(&args.inputs)?;

    println!();
    println!("✅ Done!");
    for chart in &report.charts {
        println!("   Chart saved to {}", chart.display());
    }
    println!("   Export saved to {}", report.export_path.display());

    let histogram = &report.aggregates.histogram;
    println!();
    println!("📊 Summary:");
    println!("   Files:     {}", report.sources.len());
    println!("   Messages:  {}", report.messages.len());
    println!("   Days:      {}", report.aggregates.timeline.len());
    println!(
        "   Mood:      {} negative / {} neutral / {} positive",
        histogram.negative, histogram.neutral, histogram.positive
    );
    for (topic, count) in report.aggregates.topics.iter() {
        println!("   {:<10} {}", format!("{}:", topic), count);
    }

    println!();
    println!("⚡ Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(not(feature = "candle"))]
fn run_full(_config: &PipelineConfig, _args: &Args, _total_start: Instant) -> Result<(), ChatmoodError> {
    Err(ChatmoodError::config(
        "built without the `candle` feature; only --extract-only is available",
    ))
}
