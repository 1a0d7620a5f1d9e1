//! TCP server tests
//!
//! Run `serve` on an ephemeral port and talk to it with real clients.

use std::sync::Arc;

use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use smartplate::{PlateCheckService, RecordStore, SqliteStore};
use tempfile::tempdir;

use crate::common::*;

#[tokio::test]
async fn test_serves_checks_and_reports_stats() {
    let server = TestServer::start(service_for(scenario_store())).await;

    let (mut client, _) = connect_async(server.url(WS_PATH)).await.unwrap();
    assert_status(&check(&mut client, "ABC123").await, "valid");
    assert_status(&check(&mut client, "XYZ999").await, "not_found");
    send_text(&mut client, "{").await;
    assert_status(&recv_json(&mut client).await, "bad_request");

    let stats = server.stop().await;
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.frames_handled, 3);
}

#[tokio::test]
async fn test_wrong_path_is_rejected() {
    let server = TestServer::start(service_for(scenario_store())).await;

    match connect_async(server.url("/other")).await {
        Err(WsError::Http(resp)) => assert_eq!(resp.status().as_u16(), 404),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("upgrade on the wrong path should fail"),
    }

    // The listener keeps accepting after a rejected upgrade
    let (mut client, _) = connect_async(server.url(WS_PATH)).await.unwrap();
    assert_status(&check(&mut client, "EXP001").await, "expired");

    let stats = server.stop().await;
    assert_eq!(stats.connections, 2);
    assert_eq!(stats.frames_handled, 1);
}

#[tokio::test]
async fn test_concurrent_clients_are_independent() {
    let server = TestServer::start(service_for(scenario_store())).await;

    let mut tasks = Vec::new();
    for i in 0..4 {
        let url = server.url(WS_PATH);
        tasks.push(tokio::spawn(async move {
            let (mut client, _) = connect_async(url).await.unwrap();
            let mut statuses = Vec::new();
            for round in 0..5 {
                let plate = if (i + round) % 2 == 0 { "ABC123" } else { "NOPE01" };
                let resp = check(&mut client, plate).await;
                assert_eq!(resp["plate"], plate);
                statuses.push(resp["status"].as_str().unwrap().to_string());
            }
            statuses
        }));
    }

    for task in tasks {
        let statuses = task.await.unwrap();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.iter().all(|s| s == "valid" || s == "not_found"));
    }

    let stats = server.stop().await;
    assert_eq!(stats.connections, 4);
    assert_eq!(stats.frames_handled, 20);
}

#[tokio::test]
async fn test_shutdown_with_idle_client_drains() {
    let server = TestServer::start(service_for(scenario_store())).await;
    let (mut client, _) = connect_async(server.url(WS_PATH)).await.unwrap();
    check(&mut client, "ABC123").await;

    let stats = server.stop().await;
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.frames_handled, 1);
}

#[tokio::test]
async fn test_end_to_end_against_sqlite() {
    let dir = tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("records.sqlite")).unwrap();
    store.import(&scenario_seed()).unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(store);
    let server = TestServer::start(Arc::new(PlateCheckService::for_store(store, None))).await;

    let (mut client, _) = connect_async(server.url(WS_PATH)).await.unwrap();

    let resp = check(&mut client, "ABC123").await;
    assert_status(&resp, "valid");
    assert_eq!(detail_plate_numbers(&resp), vec!["ABC123", "ABC000"]);
    assert_eq!(resp["details"]["user_record"]["email"], "juan@example.com");
    assert!(resp["details"]["user_record"].get("password_hash").is_none());

    let resp = check(&mut client, "EXP001").await;
    assert_status(&resp, "expired");
    assert!(resp["details"].get("user_record").is_none());

    assert_no_details(&check(&mut client, "XYZ999").await);

    server.stop().await;
}
