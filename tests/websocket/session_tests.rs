//! Session protocol tests
//!
//! Each test opens one session over `tokio::io::duplex` and exchanges frames
//! the way a plate scanner would.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;

use smartplate::{CloseReason, LookupError, LookupOp, MemoryStore, PlateCheckService};

use crate::common::*;

// ============================================================================
// STATUS SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_valid_plate_with_full_details() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    let resp = check(&mut s.client, "ABC123").await;
    assert_status(&resp, "valid");
    assert_eq!(resp["plate"], "ABC123");

    let details = &resp["details"];
    assert_eq!(details["registration_form"]["registration_form_id"], "RF-100");
    assert_eq!(details["registration_form"]["lto_client_id"], "C1");
    assert_eq!(detail_plate_numbers(&resp), vec!["ABC123", "ABC000"]);
    assert_eq!(details["user_record"]["lto_client_id"], "C1");
    assert_eq!(details["user_record"]["first_name"], "Juan");
}

#[tokio::test]
async fn test_user_record_never_carries_credentials() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    let resp = check(&mut s.client, "ABC123").await;
    let user = resp["details"]["user_record"].as_object().unwrap();
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("password_hash"));
}

#[tokio::test]
async fn test_unknown_plate_is_not_found_without_details() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    let resp = check(&mut s.client, "XYZ999").await;
    assert_eq!(resp, serde_json::json!({"plate": "XYZ999", "status": "not_found"}));
}

#[tokio::test]
async fn test_expired_plate_keeps_details_without_owner() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    let resp = check(&mut s.client, "EXP001").await;
    assert_status(&resp, "expired");
    assert_eq!(detail_plate_numbers(&resp), vec!["EXP001"]);
    assert!(resp["details"].get("registration_form").is_none());
    assert!(resp["details"].get("user_record").is_none());
}

#[tokio::test]
async fn test_lookup_failure_is_error_without_details() {
    let store = scenario_store();
    store.fail(
        LookupOp::PlateByNumber,
        LookupError::Unknown {
            message: "connection refused".to_string(),
        },
    );
    let mut s = open_duplex_session(service_for(store)).await;

    let resp = check(&mut s.client, "ABC123").await;
    assert_status(&resp, "error");
    assert_eq!(resp["plate"], "ABC123");
    assert_no_details(&resp);
}

#[tokio::test]
async fn test_failed_secondary_lookups_degrade_details() {
    let store = scenario_store();
    store.fail(
        LookupOp::PlatesByVehicle,
        LookupError::Transient {
            message: "busy".to_string(),
        },
    );
    store.fail(
        LookupOp::UserByClientId,
        LookupError::Unknown {
            message: "users table missing".to_string(),
        },
    );
    let mut s = open_duplex_session(service_for(store)).await;

    let resp = check(&mut s.client, "ABC123").await;
    assert_status(&resp, "valid");
    assert_eq!(resp["details"]["registration_form"]["registration_form_id"], "RF-100");
    assert!(resp["details"].get("plates").is_none());
    assert!(resp["details"].get("user_record").is_none());
}

#[tokio::test]
async fn test_slow_lookup_times_out_as_error() {
    let store = scenario_store();
    store.set_delay(Some(Duration::from_millis(500)));
    let service = Arc::new(PlateCheckService::for_store(
        store,
        Some(Duration::from_millis(25)),
    ));
    let mut s = open_duplex_session(service).await;

    let resp = check(&mut s.client, "ABC123").await;
    assert_status(&resp, "error");
    assert_no_details(&resp);
}

// ============================================================================
// MALFORMED FRAMES
// ============================================================================

#[tokio::test]
async fn test_bad_frames_do_not_close_the_session() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    for bad in ["not json", r#"{"plate": 42}"#, r#"{"timestamp": "x"}"#, r#"{"plate": ""}"#] {
        send_text(&mut s.client, bad).await;
        let resp = recv_json(&mut s.client).await;
        assert_eq!(resp, serde_json::json!({"status": "bad_request"}), "frame {:?}", bad);
    }

    let resp = check(&mut s.client, "ABC123").await;
    assert_status(&resp, "valid");
}

#[tokio::test]
async fn test_padded_plate_matches_like_the_cli() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    send_text(&mut s.client, r#"{"plate": " ABC123 "}"#).await;
    let resp = recv_json(&mut s.client).await;
    assert_status(&resp, "valid");
    assert_eq!(resp["plate"], "ABC123");
}

#[tokio::test]
async fn test_binary_frames_are_decoded() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    s.client
        .send(Message::Binary(br#"{"plate":"XYZ999"}"#.to_vec()))
        .await
        .unwrap();
    let resp = recv_json(&mut s.client).await;
    assert_status(&resp, "not_found");
}

// ============================================================================
// ORDERING AND LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_responses_follow_request_order() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    let plates = ["ABC123", "XYZ999", "EXP001", "ABC000", "NOPE01"];
    for plate in plates {
        send_check(&mut s.client, plate).await;
    }
    let mut statuses = Vec::new();
    for plate in plates {
        let resp = recv_json(&mut s.client).await;
        assert_eq!(resp["plate"], plate);
        statuses.push(resp["status"].as_str().unwrap().to_string());
    }
    assert_eq!(statuses, vec!["valid", "not_found", "expired", "expired", "not_found"]);
}

#[tokio::test]
async fn test_client_close_ends_session() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;

    check(&mut s.client, "ABC123").await;
    send_text(&mut s.client, "garbage").await;
    recv_json(&mut s.client).await;
    s.client.close(None).await.unwrap();

    let summary = s.session.await.unwrap();
    assert_eq!(summary.reason, CloseReason::ClientClosed);
    assert_eq!(summary.frames_handled, 2);
    assert!(summary.session_id.starts_with("ses_"));
}

#[tokio::test]
async fn test_dropped_transport_ends_session() {
    let s = open_duplex_session(service_for(scenario_store())).await;
    drop(s.client);

    let summary = s.session.await.unwrap();
    assert!(
        matches!(summary.reason, CloseReason::StreamEnded | CloseReason::ReadError(_)),
        "unexpected close reason {:?}",
        summary.reason
    );
}

#[tokio::test]
async fn test_shutdown_sends_going_away() {
    let mut s = open_duplex_session(service_for(scenario_store())).await;
    check(&mut s.client, "ABC123").await;

    s.shutdown.send(true).unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), s.client.next())
        .await
        .expect("no close frame")
        .expect("stream ended")
        .expect("WebSocket error");
    match msg {
        Message::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Away),
        other => panic!("expected close frame, got {:?}", other),
    }

    let summary = s.session.await.unwrap();
    assert_eq!(summary.reason, CloseReason::Shutdown);
    assert_eq!(summary.frames_handled, 1);
}

#[tokio::test]
async fn test_sessions_share_no_state() {
    let store = scenario_store();
    let service = service_for(store);
    let mut a = open_duplex_session(Arc::clone(&service)).await;
    let mut b = open_duplex_session(service).await;

    send_text(&mut a.client, "{{{").await;
    let resp_b = check(&mut b.client, "ABC123").await;
    let resp_a = recv_json(&mut a.client).await;

    assert_status(&resp_a, "bad_request");
    assert_status(&resp_b, "valid");

    drop(a);
    let resp_b = check(&mut b.client, "EXP001").await;
    assert_status(&resp_b, "expired");
}

#[tokio::test]
async fn test_empty_store_answers_every_plate_not_found() {
    let mut s = open_duplex_session(service_for(Arc::new(MemoryStore::new()))).await;

    for plate in ["ABC123", "EXP001"] {
        let resp = check(&mut s.client, plate).await;
        assert_status(&resp, "not_found");
        assert_no_details(&resp);
    }
}
