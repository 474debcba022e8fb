//! End-to-end protocol tests against the scripted transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use galileo_core::{
    Datalogger, DownloadOptions, Error, MockTransportBuilder, ProtocolError, StopReason, Timing,
    summarize,
};
use time::macros::datetime;
use tokio_util::sync::CancellationToken;

fn ten_full_blocks() -> MockTransportBuilder {
    MockTransportBuilder::new()
        .header(datetime!(2024-01-01 0:00), 15)
        .full_blocks(10, (50, 600))
}

#[tokio::test(start_paused = true)]
async fn test_empty_read_at_block_ten_keeps_blocks_zero_to_nine() {
    let mut logger = Datalogger::with_transport(ten_full_blocks().build(), Timing::default());

    let download = logger.download(&DownloadOptions::default()).await.unwrap();

    assert_eq!(download.samples.len(), 10 * 32);
    assert_eq!(download.blocks_read, 10);
    assert_eq!(download.stop_reason, StopReason::EmptyRead { block: 10 });
    assert_eq!(
        download.samples.last().unwrap().timestamp,
        datetime!(2024-01-04 7:45)
    );
    assert_eq!(
        logger.transport().block_requests(),
        (0..=10).collect::<Vec<u8>>()
    );
}

#[tokio::test(start_paused = true)]
async fn test_header_after_noise_gives_same_session() {
    let clean = ten_full_blocks().build();
    let noisy = ten_full_blocks().noise(&[0x00, 0x5C, 0x13, 0x37, 0xEE]).build();

    let a = Datalogger::with_transport(clean, Timing::default())
        .download(&DownloadOptions::default())
        .await
        .unwrap();
    let b = Datalogger::with_transport(noisy, Timing::default())
        .download(&DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_header_date_is_fatal() {
    let mut raw = galileo_core::mock::encode_header(datetime!(2024-01-01 0:00), 15).to_vec();
    raw[15] = 0x13;
    let mut logger = Datalogger::with_transport(
        MockTransportBuilder::new().raw_header(raw).build(),
        Timing::default(),
    );

    let err = logger.download(&DownloadOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::InvalidDate { month: 13, .. })
    ));
    assert!(logger.transport().block_requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_fatal() {
    let raw = galileo_core::mock::encode_header(datetime!(2024-01-01 0:00), 0).to_vec();
    let mut logger = Datalogger::with_transport(
        MockTransportBuilder::new().raw_header(raw).build(),
        Timing::default(),
    );

    let err = logger.download(&DownloadOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ProtocolError::InvalidInterval)));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_mid_scan_returns_partial_session() {
    let transport = ten_full_blocks().disconnect_at_block(4).build();
    let mut logger = Datalogger::with_transport(transport, Timing::default());

    let download = logger.download(&DownloadOptions::default()).await.unwrap();

    assert_eq!(download.samples.len(), 4 * 32);
    assert!(download.is_partial());
    assert!(matches!(
        download.stop_reason,
        StopReason::TransportClosed { block: 4, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_from_progress_callback() {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let options = DownloadOptions::new()
        .cancel_token(token)
        .with_progress(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            if p.blocks_read == 3 {
                trigger.cancel();
            }
        });

    let mut logger = Datalogger::with_transport(ten_full_blocks().build(), Timing::default());
    let download = logger.download(&options).await.unwrap();

    assert_eq!(download.samples.len(), 3 * 32);
    assert_eq!(download.stop_reason, StopReason::Cancelled { block: 3 });
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_max_blocks_limits_scan() {
    let mut logger = Datalogger::with_transport(ten_full_blocks().build(), Timing::default());
    let download = logger
        .download(&DownloadOptions::new().max_blocks(2))
        .await
        .unwrap();

    assert_eq!(download.blocks_read, 2);
    assert_eq!(download.stop_reason, StopReason::BlockLimit { blocks: 2 });
    assert_eq!(logger.transport().block_requests(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_download_into_session_and_summary() {
    let transport = MockTransportBuilder::new()
        .header(datetime!(2024-06-01 8:00), 10)
        .block(0, &[(40, 550), (60, 650), (0, 600)])
        .build();
    let mut logger = Datalogger::with_transport(transport, Timing::default());

    let session = logger
        .download(&DownloadOptions::default())
        .await
        .unwrap()
        .into_session("HELADERA", Some("LAB1"));

    let stats = summarize(session.samples()).into_stats().unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.start, datetime!(2024-06-01 8:00));
    assert_eq!(stats.end, datetime!(2024-06-01 8:20));
    assert_eq!(stats.temperature.min, 0.0);
    assert_eq!(stats.temperature.max, 6.0);
    assert_eq!(stats.humidity.mean, 60.0);
}
