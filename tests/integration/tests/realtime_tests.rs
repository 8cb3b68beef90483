//! Realtime Integration Tests
//!
//! A message posted to the REST API reaches a delivery client connected to
//! a separate gateway through the Redis relay.
//!
//! Requires PostgreSQL, Redis and DATABASE_URL, REDIS_URL, JWT_SECRET.
//!
//! Run with: cargo test -p integration-tests --test realtime_tests

use std::time::Duration;

use chat_client::{ClientConfig, ClientEvent, ClientHandle, WsConnector};
use chat_core::UserId;
use integration_tests::{assert_json, fixtures::*, TestEnv, TestGateway, TestServer};
use reqwest::StatusCode;
use tokio::sync::broadcast;

const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

async fn next_matching<F>(events: &mut broadcast::Receiver<ClientEvent>, mut matches: F) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(EVENT_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("client stopped"),
            }
        }
    })
    .await
    .expect("timed out waiting for client event")
}

#[tokio::test]
async fn test_rest_message_reaches_gateway_client() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let gateway = TestGateway::start(&env).await.expect("Failed to start gateway");

    let alice = UserId::new();
    let bob = UserId::new();
    let posting = env.seed_posting("Data platform referral").await.unwrap();

    let response = server
        .post_auth(CONVERSATIONS, &env.token_for(alice), &CreateConversationBody::post_linked(&posting, &[bob]))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();

    let client = ClientHandle::spawn(WsConnector::new(gateway.url()), ClientConfig::new(env.token_for(bob)));
    let mut events = client.subscribe();
    client.join_room(conversation.id.clone()).await.unwrap();

    let joined = next_matching(&mut events, |e| {
        matches!(e, ClientEvent::RoomJoined { .. } | ClientEvent::RoomRejected { .. })
    })
    .await;
    assert!(matches!(joined, ClientEvent::RoomJoined { ref room_id } if *room_id == conversation.id));

    // Give the gateway's Redis subscription a moment to settle
    tokio::time::sleep(Duration::from_millis(200)).await;

    let response = server
        .post_auth(&messages_path(&conversation.id), &env.token_for(alice), &MessageBody::text("Still hiring?"))
        .await
        .unwrap();
    let sent: MessageView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let delivered = next_matching(&mut events, |e| {
        matches!(e, ClientEvent::Room { event, .. } if event == "message:new")
    })
    .await;
    let ClientEvent::Room { data, .. } = delivered else {
        unreachable!()
    };
    assert_eq!(data["id"], sent.id);
    assert_eq!(data["content"], "Still hiring?");
    assert_eq!(data["sender_id"], alice.to_string());

    client.close().await.ok();
}

#[tokio::test]
async fn test_gateway_send_is_visible_over_rest() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let gateway = TestGateway::start(&env).await.expect("Failed to start gateway");

    let alice = UserId::new();
    let bob = UserId::new();

    let response = server
        .post_auth(CONVERSATIONS, &env.token_for(alice), &CreateConversationBody::direct(bob))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();

    let client = ClientHandle::spawn(WsConnector::new(gateway.url()), ClientConfig::new(env.token_for(alice)));
    let mut events = client.subscribe();
    client.join_room(conversation.id.clone()).await.unwrap();
    let nonce = client.send_message(conversation.id.clone(), "Sent over the socket").await.unwrap();

    let acked = next_matching(&mut events, |e| {
        matches!(e, ClientEvent::MessageAcked { .. } | ClientEvent::MessageRejected { .. })
    })
    .await;
    let ClientEvent::MessageAcked { nonce: acked_nonce, message } = acked else {
        panic!("send rejected: {acked:?}");
    };
    assert_eq!(acked_nonce.as_deref(), Some(nonce.as_str()));

    let response = server
        .get_auth(&messages_path(&conversation.id), &env.token_for(bob))
        .await
        .unwrap();
    let history: Vec<MessageView> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, message.id.to_string());
    assert_eq!(history[0].content.as_deref(), Some("Sent over the socket"));

    client.close().await.ok();
}
