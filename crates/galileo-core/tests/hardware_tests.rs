//! Hardware integration tests for galileo-core
//!
//! These tests require a logger on a serial port and should be run with:
//! ```text
//! cargo test --package galileo-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! Set `GALILEO_PORT` to the port the logger is attached to.

use std::env;
use std::time::Duration;

use galileo_core::{Datalogger, DownloadOptions, Timing, available_ports};
use tokio::time::timeout;

/// A full 255-block scan takes a little over 80 seconds.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

fn port() -> String {
    env::var("GALILEO_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string())
}

#[test]
#[ignore = "requires serial hardware"]
fn test_list_ports() {
    let ports = available_ports().expect("failed to list ports");
    println!("Found {} ports", ports.len());
    for p in &ports {
        println!("  {} ({})", p.name, p.description);
    }
}

#[tokio::test]
#[ignore = "requires serial hardware"]
async fn test_read_header() {
    let mut logger = Datalogger::open(&port(), 9600, Timing::default())
        .await
        .expect("failed to open port");

    logger.wake().await.expect("wake failed");
    let meta = logger.read_header().await.expect("header failed");
    println!("Header: {}", meta);
    assert!(meta.interval_minutes > 0);

    logger.close().await.expect("close failed");
}

#[tokio::test]
#[ignore = "requires serial hardware"]
async fn test_full_download() {
    let mut logger = Datalogger::open(&port(), 9600, Timing::default())
        .await
        .expect("failed to open port");

    let download = timeout(
        DOWNLOAD_TIMEOUT,
        logger.download(&DownloadOptions::default().with_progress(|p| {
            println!("block {} / {} samples", p.blocks_read, p.samples);
        })),
    )
    .await
    .expect("download timed out")
    .expect("download failed");

    println!(
        "{} samples from {} blocks ({})",
        download.samples.len(),
        download.blocks_read,
        download.stop_reason
    );
    logger.close().await.expect("close failed");
}
