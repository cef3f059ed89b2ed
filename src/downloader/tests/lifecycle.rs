use crate::downloader::test_helpers::{create_test_downloader, recv_event};
use crate::error::Error;
use crate::types::Event;

// --- shutdown() tests ---

#[tokio::test]
async fn shutdown_rejects_new_downloads() {
    let (downloader, _client, _temp_dir) = create_test_downloader().await;

    assert!(downloader.is_accepting_new());
    downloader.shutdown().await.unwrap();
    assert!(!downloader.is_accepting_new());

    let err = downloader
        .start_download("https://example.com/late.bin")
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::ShuttingDown),
        "post-shutdown start must be rejected, got {err:?}"
    );
}

#[tokio::test]
async fn shutdown_cancels_in_flight_transfers() {
    let (downloader, client, _temp_dir) = create_test_downloader().await;

    downloader
        .start_download("https://example.com/a.bin")
        .await
        .unwrap();
    downloader
        .start_download("https://example.com/b.bin")
        .await
        .unwrap();

    let first = client.next_transfer().await;
    let second = client.next_transfer().await;

    downloader.shutdown().await.unwrap();

    assert!(first.cancel.is_cancelled());
    assert!(second.cancel.is_cancelled());
    assert_eq!(downloader.active_transfer_count().await, 0);
}

#[tokio::test]
async fn shutdown_emits_shutdown_event() {
    let (downloader, _client, _temp_dir) = create_test_downloader().await;
    let mut events = downloader.subscribe();

    downloader.shutdown().await.unwrap();

    match recv_event(&mut events).await {
        Event::Shutdown => {}
        other => panic!("expected Shutdown event, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let (downloader, _client, _temp_dir) = create_test_downloader().await;

    downloader.shutdown().await.unwrap();
    downloader
        .shutdown()
        .await
        .expect("repeated shutdown must succeed");
}

#[tokio::test]
async fn registry_stays_readable_after_shutdown() {
    let (downloader, _client, _temp_dir) = create_test_downloader().await;

    let id = downloader
        .start_download("https://example.com/keep.bin")
        .await
        .unwrap();

    downloader.shutdown().await.unwrap();

    let snapshot = downloader.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id, "shutdown must not clear the registry");
}
