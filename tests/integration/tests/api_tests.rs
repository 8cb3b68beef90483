//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL, JWT_SECRET
//!
//! Run with: cargo test -p integration-tests --test api_tests

use chat_core::UserId;
use integration_tests::{
    assert_json, assert_status, error_code, fixtures::*, TestEnv, TestServer,
};
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: serde_json::Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Conversation Tests
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let response = server.get(CONVERSATIONS).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.get_auth(CONVERSATIONS, "not-a-jwt").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await.unwrap(), "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_post_linked_conversation_is_reused() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let posting = env.seed_posting("Staff engineer referral").await.unwrap();
    let alice = UserId::new();
    let bob = UserId::new();

    let response = server
        .post_auth(CONVERSATIONS, &env.token_for(alice), &CreateConversationBody::post_linked(&posting, &[bob]))
        .await
        .unwrap();
    let first: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(first.kind, "POST_LINKED");
    assert_eq!(first.posting_ref.as_deref(), Some(posting.as_str()));
    assert_eq!(first.posting_title.as_deref(), Some("Staff engineer referral"));
    assert_eq!(first.participant_count, 2);

    // Asked for again from the other side
    let response = server
        .post_auth(CONVERSATIONS, &env.token_for(bob), &CreateConversationBody::post_linked(&posting, &[alice]))
        .await
        .unwrap();
    let second: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn test_unknown_posting_is_not_found() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let response = server
        .post_auth(
            CONVERSATIONS,
            &env.token_for(UserId::new()),
            &CreateConversationBody::post_linked("P-does-not-exist", &[UserId::new()]),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_member_cannot_see_conversation() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let alice = UserId::new();
    let response = server
        .post_auth(CONVERSATIONS, &env.token_for(alice), &CreateConversationBody::direct(UserId::new()))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();

    let outsider = env.token_for(UserId::new());
    let response = server.get_auth(&conversation_path(&conversation.id), &outsider).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .post_auth(&messages_path(&conversation.id), &outsider, &MessageBody::text("hello?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_join_leave_and_archive() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let alice = UserId::new();
    let bob = UserId::new();
    let carol = UserId::new();
    let alice_token = env.token_for(alice);
    let carol_token = env.token_for(carol);

    let response = server
        .post_auth(CONVERSATIONS, &alice_token, &CreateConversationBody::group("Class of 2012", &[bob]))
        .await
        .unwrap();
    let group: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    let participants = format!("{}/participants", conversation_path(&group.id));

    let response = server
        .post_auth(&participants, &carol_token, &ParticipantBody { user_id: carol })
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    // Only an admin may archive a group
    let archive = format!("{}/archive", conversation_path(&group.id));
    let response = server.post_empty_auth(&archive, &carol_token).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .delete_auth(&format!("{participants}/@me"), &carol_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.post_empty_auth(&archive, &alice_token).await.unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.get_auth(CONVERSATIONS, &alice_token).await.unwrap();
    let listed: Vec<ConversationSummaryBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(listed.iter().all(|c| c.id != group.id));

    let response = server
        .get_auth(&format!("{CONVERSATIONS}?include_archived=true"), &alice_token)
        .await
        .unwrap();
    let listed: Vec<ConversationSummaryBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(listed.iter().any(|c| c.id == group.id && c.archived));
}

// ============================================================================
// Message Tests
// ============================================================================

#[tokio::test]
async fn test_message_lifecycle() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let alice = UserId::new();
    let bob = UserId::new();
    let alice_token = env.token_for(alice);
    let bob_token = env.token_for(bob);

    let response = server
        .post_auth(CONVERSATIONS, &alice_token, &CreateConversationBody::direct(bob))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    let messages = messages_path(&conversation.id);

    let response = server.post_auth(&messages, &alice_token, &MessageBody::text("Hi Bob")).await.unwrap();
    let first: MessageView = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(first.sender_id, alice.to_string());
    assert_eq!(first.conversation_id, conversation.id);

    let response = server.post_auth(&messages, &alice_token, &MessageBody::text("Are you around?")).await.unwrap();
    let second: MessageView = assert_json(response, StatusCode::CREATED).await.unwrap();

    let response = server.get_auth(CONVERSATIONS, &bob_token).await.unwrap();
    let listed: Vec<ConversationSummaryBody> = assert_json(response, StatusCode::OK).await.unwrap();
    let summary = listed.iter().find(|c| c.id == conversation.id).expect("conversation listed");
    assert_eq!(summary.unread_count, 2);
    assert!(summary.last_message.is_some());

    // Only the sender may edit
    let response = server
        .patch_auth(&message_path(&conversation.id, &first.id), &bob_token, &MessageBody::text("hijacked"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = server
        .patch_auth(&message_path(&conversation.id, &first.id), &alice_token, &MessageBody::text("Hi Bob!"))
        .await
        .unwrap();
    let edited: MessageView = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(edited.content.as_deref(), Some("Hi Bob!"));
    assert!(edited.edited_at.is_some());

    let response = server
        .delete_auth(&message_path(&conversation.id, &second.id), &alice_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.get_auth(&format!("{messages}?limit=10"), &bob_token).await.unwrap();
    let history: Vec<MessageView> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.id);
    assert_eq!(history[1].id, second.id);
    assert!(history[1].content.is_none());
    assert!(history[1].deleted_at.is_some());

    let response = server
        .post_empty_auth(&format!("{}/read", conversation_path(&conversation.id)), &bob_token)
        .await
        .unwrap();
    let read: ReadStateBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(read.unread_count, 0);
}

#[tokio::test]
async fn test_history_pages_backwards() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let alice = UserId::new();
    let token = env.token_for(alice);

    let response = server
        .post_auth(CONVERSATIONS, &token, &CreateConversationBody::direct(UserId::new()))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    let messages = messages_path(&conversation.id);

    for n in 0..5 {
        let response = server.post_auth(&messages, &token, &MessageBody::text(&format!("m{n}"))).await.unwrap();
        assert_status(response, StatusCode::CREATED).await.unwrap();
    }

    let response = server.get_auth(&format!("{messages}?limit=2"), &token).await.unwrap();
    let newest: Vec<MessageView> = assert_json(response, StatusCode::OK).await.unwrap();
    let contents: Vec<_> = newest.iter().filter_map(|m| m.content.as_deref()).collect();
    assert_eq!(contents, ["m3", "m4"]);

    let response = server
        .get_auth(&format!("{messages}?limit=2&before={}", newest[0].id), &token)
        .await
        .unwrap();
    let older: Vec<MessageView> = assert_json(response, StatusCode::OK).await.unwrap();
    let contents: Vec<_> = older.iter().filter_map(|m| m.content.as_deref()).collect();
    assert_eq!(contents, ["m1", "m2"]);
}

#[tokio::test]
async fn test_duplicate_reaction_conflicts() {
    let Some(env) = TestEnv::load().await else {
        return;
    };

    let server = TestServer::start(&env).await.expect("Failed to start server");
    let alice = UserId::new();
    let token = env.token_for(alice);

    let response = server
        .post_auth(CONVERSATIONS, &token, &CreateConversationBody::direct(UserId::new()))
        .await
        .unwrap();
    let conversation: ConversationBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    let response = server
        .post_auth(&messages_path(&conversation.id), &token, &MessageBody::text("Got the offer!"))
        .await
        .unwrap();
    let message: MessageView = assert_json(response, StatusCode::CREATED).await.unwrap();
    let reactions = reactions_path(&conversation.id, &message.id);

    let response = server.post_auth(&reactions, &token, &ReactionBody::new("🎉")).await.unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    let response = server.post_auth(&reactions, &token, &ReactionBody::new("🎉")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(response).await.unwrap(), "REACTION_ALREADY_EXISTS");

    let response = server.get_auth(&reactions, &token).await.unwrap();
    let listed: Vec<serde_json::Value> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(listed.len(), 1);
}
