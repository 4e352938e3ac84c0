//! receipt-scan - Receipt field extraction
//!
//! Replays a recorded capture (detections + OCR text blocks) through the
//! extraction pipeline and prints the resulting record.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use receipt_scan::capture::recording::load_recording;
use receipt_scan::config::{self, AppConfig, OutputFormat};
use receipt_scan::storage;
use receipt_scan::vision::{RecordedDetector, RecordedRecognizer};
use receipt_scan::{CaptureSession, ReceiptRecord, ReceiptScanner, ScanEvent};

/// receipt-scan - Extract receipt fields from recorded OCR output
#[derive(Parser, Debug)]
#[command(name = "receipt-scan")]
#[command(about = "Extract address, date, item, order id and amounts from receipt OCR output")]
struct Args {
    /// Recorded capture (JSON with frame size, detections and text blocks)
    #[arg(required_unless_present = "write_default_config")]
    input: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the minimum detection confidence for regions of interest
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the default configuration file and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the record
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.write_default_config {
        let path = match args.config {
            Some(path) => path,
            None => storage::default_config_path()?,
        };
        config::save_config(&AppConfig::default(), &path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = load_or_default_config(args.config.as_deref())?;
    if let Some(min_confidence) = args.min_confidence {
        config.extraction.min_confidence = min_confidence;
    }
    let format = args.format.unwrap_or(config.output.format);

    let input = args.input.context("No recording given")?;
    let recording = load_recording(&input)?;
    info!(
        "Loaded recording {:?}: {}x{}, {} detections, {} text blocks",
        input,
        recording.frame.width,
        recording.frame.height,
        recording.detections.len(),
        recording.text_blocks.len()
    );

    let detector = Arc::new(RecordedDetector::new(
        config.detector.input_size,
        recording.detections.clone(),
    ));
    let recognizer = Arc::new(RecordedRecognizer::new(recording.text_blocks.clone()));
    let scanner = ReceiptScanner::from_config(&config, detector, recognizer)?;

    let session = CaptureSession::new();
    let (events_tx, events_rx) = unbounded();

    let rt = Runtime::new().context("Failed to create tokio runtime")?;
    let outcome = rt.block_on(scanner.scan_and_notify(&session, Some(recording.frame()), &events_tx));
    drop(events_tx);

    for event in events_rx.iter() {
        match event {
            ScanEvent::Started { request_id } => info!("Processing capture {}", request_id),
            ScanEvent::Completed { record, .. } => {
                print_record(&record, format, config.output.pretty)?;
            }
            ScanEvent::Failed { reason, .. } => warn!("Capture failed: {}", reason),
        }
    }

    outcome.context("Receipt scan failed")?;
    Ok(())
}

/// Load configuration from an explicit path, the default location, or defaults
fn load_or_default_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_path) = storage::default_config_path() {
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring invalid configuration: {:#}", e),
            }
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn print_record(record: &ReceiptRecord, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = if pretty {
                serde_json::to_string_pretty(record)?
            } else {
                serde_json::to_string(record)?
            };
            println!("{}", json);
        }
        OutputFormat::Text => {
            for (key, value) in record.fields() {
                println!("{}: {}", key, value);
            }
        }
    }
    Ok(())
}
