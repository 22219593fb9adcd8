//! Integration tests for byte-based flood protection.

mod common;

use common::TestServer;

#[tokio::test]
async fn test_flooder_is_disconnected() {
    let server = TestServer::spawn_with(
        16810,
        "[flood]\nperiod = 60\nuser_threshold = 200\n",
    )
    .await
    .expect("Failed to spawn server");
    let mut client = server.connect().await.expect("Failed to connect");

    // One write, so the server has read the whole burst before it closes
    client.send_raw(&"PING\n".repeat(60)).await.unwrap();

    let lines = client
        .recv_until(|l| l.starts_with("SERVERMSG Flood protection"))
        .await
        .unwrap();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("SERVERMSG Flood protection: you are being disconnected for flooding")
    );
    client.expect_closed().await.unwrap();
}

#[tokio::test]
async fn test_warn_action_keeps_session() {
    let server = TestServer::spawn_with(
        16811,
        "[flood]\nperiod = 60\nuser_threshold = 200\naction = \"warn\"\n",
    )
    .await
    .expect("Failed to spawn server");
    let mut client = server.connect().await.expect("Failed to connect");

    client.send_raw(&"PING\n".repeat(60)).await.unwrap();
    client
        .expect_prefix("SERVERMSG Flood protection: you are sending too much data")
        .await
        .unwrap();
    client.drain().await;

    client.send_raw("PING").await.unwrap();
    assert_eq!(client.recv().await.unwrap(), "PONG");
}

#[tokio::test]
async fn test_floodlevel_requires_admin() {
    let server = TestServer::spawn(16812).await.expect("Failed to spawn server");
    let mut alice = server.login("alice", "pw").await.expect("alice login");
    let mut root = server.login("root", "toor").await.expect("root login");

    alice.send_raw("FLOODLEVEL PERIOD 120").await.unwrap();
    assert_eq!(
        alice.expect_prefix("SERVERMSG").await.unwrap(),
        "SERVERMSG Insufficient access for FLOODLEVEL (required: ADMIN, held: NORMAL)"
    );

    root.send_raw("FLOODLEVEL PERIOD 120").await.unwrap();
    assert_eq!(
        root.expect_prefix("SERVERMSG").await.unwrap(),
        "SERVERMSG Flood record period set to 120 seconds"
    );

    root.send_raw("FLOODLEVEL bot 0").await.unwrap();
    assert_eq!(
        root.expect_prefix("SERVERMSG").await.unwrap(),
        "SERVERMSG Flood parameter BOT must be positive, got 0"
    );
}

#[tokio::test]
async fn test_lowered_threshold_applies_to_live_sessions() {
    let server = TestServer::spawn(16813).await.expect("Failed to spawn server");
    let mut alice = server.login("alice", "pw").await.expect("alice login");
    let mut root = server.login("root", "toor").await.expect("root login");

    root.send_raw("FLOODLEVEL USER 100").await.unwrap();
    root.expect_prefix("SERVERMSG Flood threshold for users")
        .await
        .unwrap();

    alice.send_raw(&"PING\n".repeat(40)).await.unwrap();
    alice
        .expect_prefix("SERVERMSG Flood protection")
        .await
        .unwrap();
    alice.expect_closed().await.unwrap();
    root.expect_prefix("REMOVEUSER alice").await.unwrap();
}

#[tokio::test]
async fn test_unterminated_input_counts_toward_flood() {
    let server = TestServer::spawn_with(16814, "[flood]\nperiod = 60\nuser_threshold = 1000\n")
        .await
        .expect("Failed to spawn server");
    let mut client = server.connect().await.expect("Failed to connect");

    // Never terminated, so no line is ever completed
    client.send_bytes(&[b'A'; 3000]).await.unwrap();

    client
        .expect_prefix("SERVERMSG Flood protection: you are being disconnected")
        .await
        .unwrap();
    client.expect_closed().await.unwrap();
}
