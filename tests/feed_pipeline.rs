//! Feed Pipeline Integration Tests
//!
//! Tests the full flow from feed events through the pipeline to the
//! broadcast hub's subscribers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use tickfeed::{
    Batch, BroadcastConfig, DataPoint, FeedBroadcastHub, FeedEvent, FeedHandle, FeedPipeline,
    FeedState, FeedStatus, SnapshotSink, WatchSet,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct TestRig {
    hub: Arc<FeedBroadcastHub>,
    event_tx: mpsc::Sender<FeedEvent>,
    handle: FeedHandle,
    cancel: CancellationToken,
    join: tokio::task::JoinHandle<()>,
}

fn setup_pipeline(series_cap: usize) -> TestRig {
    let hub = Arc::new(FeedBroadcastHub::new(BroadcastConfig::default()));
    let (event_tx, event_rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();

    let (pipeline, handle) = FeedPipeline::new(
        series_cap,
        Arc::clone(&hub) as Arc<dyn SnapshotSink>,
        Arc::new(FeedState::new()),
        event_rx,
        cancel.clone(),
        16,
    );
    let join = tokio::spawn(pipeline.run());

    TestRig {
        hub,
        event_tx,
        handle,
        cancel,
        join,
    }
}

fn point(symbol: &str, price: f64, secs: i64) -> DataPoint {
    DataPoint {
        symbol: symbol.to_string(),
        price,
        timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
    }
}

#[tokio::test]
async fn status_transitions_reach_subscribers() {
    let rig = setup_pipeline(50);
    let mut status_rx = rig.hub.status_rx();

    // The sequence a client emits across a first attempt, one drop, one
    // retry, and a spent budget.
    rig.event_tx.send(FeedEvent::Connecting).await.unwrap();
    rig.event_tx.send(FeedEvent::Connected).await.unwrap();
    rig.event_tx
        .send(FeedEvent::Disconnected {
            reason: "connection closed".to_string(),
            attempts_left: Some(9),
            next_retry: Duration::from_millis(1000),
        })
        .await
        .unwrap();
    rig.event_tx
        .send(FeedEvent::Reconnecting { attempt: 1 })
        .await
        .unwrap();
    rig.event_tx.send(FeedEvent::Connecting).await.unwrap();
    rig.event_tx.send(FeedEvent::Failed).await.unwrap();

    // The very first attempt surfaces Connecting before Connected.
    let first = timeout(RECV_TIMEOUT, status_rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.status, FeedStatus::Connecting);

    let second = timeout(RECV_TIMEOUT, status_rx.recv()).await.unwrap().unwrap();
    assert_eq!(second.status, FeedStatus::Connected);

    let third = timeout(RECV_TIMEOUT, status_rx.recv()).await.unwrap().unwrap();
    assert_eq!(
        third.status,
        FeedStatus::Disconnected {
            attempts_left: Some(9),
            next_retry: Duration::from_millis(1000),
        }
    );

    let fourth = timeout(RECV_TIMEOUT, status_rx.recv()).await.unwrap().unwrap();
    assert_eq!(fourth.status, FeedStatus::Connecting);

    let fifth = timeout(RECV_TIMEOUT, status_rx.recv()).await.unwrap().unwrap();
    assert_eq!(fifth.status, FeedStatus::Failed);

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn batch_produces_snapshot_and_aligned_table() {
    let rig = setup_pipeline(50);
    let mut snapshots_rx = rig.hub.snapshots_rx();
    let mut tables_rx = rig.hub.tables_rx();

    rig.handle
        .set_watch_set(WatchSet::from_iter(["AAPL", "MSFT"]))
        .await
        .unwrap();
    // Watch-set change publishes an (empty) table first.
    let initial = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert!(initial.table.is_empty());

    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![
            point("AAPL", 150.0, 100),
            point("MSFT", 300.0, 100),
        ])))
        .await
        .unwrap();
    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![point(
            "AAPL", 151.0, 200,
        )])))
        .await
        .unwrap();

    let snapshot = timeout(RECV_TIMEOUT, snapshots_rx.recv()).await.unwrap().unwrap();
    assert_eq!(snapshot.snapshot.quotes.len(), 2);

    let _first_table = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    let second_table = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();

    // Two distinct timestamps, MSFT absent at the second one.
    let rows = &second_table.table.rows;
    assert_eq!(rows.len(), 2);
    assert!(rows[0].timestamp < rows[1].timestamp);
    assert_eq!(rows[0].values["AAPL"], Some(150.0));
    assert_eq!(rows[0].values["MSFT"], Some(300.0));
    assert_eq!(rows[1].values["AAPL"], Some(151.0));
    assert_eq!(rows[1].values["MSFT"], None);

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn unwatched_symbols_never_reach_the_table() {
    let rig = setup_pipeline(50);
    let mut tables_rx = rig.hub.tables_rx();

    rig.handle.add_watch("AAPL").await.unwrap();
    let _initial = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();

    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![
            point("AAPL", 1.0, 1),
            point("TSLA", 2.0, 1),
        ])))
        .await
        .unwrap();

    let table = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert_eq!(table.table.rows.len(), 1);
    assert!(table.table.rows[0].values.contains_key("AAPL"));
    assert!(!table.table.rows[0].values.contains_key("TSLA"));

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn remove_then_re_add_starts_with_empty_series() {
    let rig = setup_pipeline(50);
    let mut tables_rx = rig.hub.tables_rx();

    rig.handle.add_watch("AAPL").await.unwrap();
    let _initial = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();

    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![point(
            "AAPL", 1.0, 1,
        )])))
        .await
        .unwrap();
    let with_data = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert_eq!(with_data.table.rows.len(), 1);

    rig.handle.remove_watch("AAPL").await.unwrap();
    let after_remove = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert!(after_remove.table.is_empty());

    rig.handle.add_watch("AAPL").await.unwrap();
    let after_re_add = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    // History was purged on removal; the re-added series is empty.
    assert!(after_re_add.table.is_empty());

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn series_stay_bounded_at_the_configured_cap() {
    let rig = setup_pipeline(3);
    let mut tables_rx = rig.hub.tables_rx();

    rig.handle.add_watch("AAPL").await.unwrap();
    let _initial = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();

    let mut last_rows = 0;
    for secs in 1..=5 {
        rig.event_tx
            .send(FeedEvent::Batch(Batch::from_points(vec![point(
                "AAPL",
                f64::from(secs),
                i64::from(secs),
            )])))
            .await
            .unwrap();
        let table = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
        last_rows = table.table.rows.len();
    }

    // Oldest points evicted; only the newest three timestamps remain.
    assert_eq!(last_rows, 3);

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn empty_watch_set_purges_everything() {
    let rig = setup_pipeline(50);
    let mut tables_rx = rig.hub.tables_rx();

    rig.handle.add_watch("AAPL").await.unwrap();
    let _initial = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();

    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![point(
            "AAPL", 1.0, 1,
        )])))
        .await
        .unwrap();
    let with_data = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert!(!with_data.table.is_empty());

    rig.handle.set_watch_set(WatchSet::new()).await.unwrap();
    let purged = timeout(RECV_TIMEOUT, tables_rx.recv()).await.unwrap().unwrap();
    assert!(purged.table.is_empty());

    rig.cancel.cancel();
    rig.join.await.unwrap();
}

#[tokio::test]
async fn decode_failures_do_not_disturb_the_flow() {
    let rig = setup_pipeline(50);
    let mut snapshots_rx = rig.hub.snapshots_rx();

    rig.handle.add_watch("AAPL").await.unwrap();
    rig.event_tx
        .send(FeedEvent::DecodeFailed("bad payload".to_string()))
        .await
        .unwrap();
    rig.event_tx
        .send(FeedEvent::Batch(Batch::from_points(vec![point(
            "AAPL", 1.0, 1,
        )])))
        .await
        .unwrap();

    let snapshot = timeout(RECV_TIMEOUT, snapshots_rx.recv()).await.unwrap().unwrap();
    assert_eq!(snapshot.snapshot.quotes[0].symbol, "AAPL");

    rig.cancel.cancel();
    rig.join.await.unwrap();
}
