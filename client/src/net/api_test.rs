use super::*;
use crate::net::types::{BreedQuery, BreedSize, Credentials, PostInput, Role};
use crate::storage::SESSION_STORAGE_KEY;
use crate::test_helpers::{data, mock_client, seed_session, user};
use reqwest::Method;
use serde_json::json;

// =============================================================================
// envelope helpers
// =============================================================================

#[test]
fn unwrap_data_strips_envelope_only_when_present() {
    assert_eq!(unwrap_data(json!({ "data": { "a": 1 } })), json!({ "a": 1 }));
    assert_eq!(unwrap_data(json!({ "users": [] })), json!({ "users": [] }));
}

#[test]
fn extract_field_prefers_data_then_root() {
    let from_data: Vec<u8> = extract_field(json!({ "data": { "xs": [1, 2] } }), "xs").unwrap();
    assert_eq!(from_data, vec![1, 2]);
    let from_root: Vec<u8> = extract_field(json!({ "xs": [3] }), "xs").unwrap();
    assert_eq!(from_root, vec![3]);
    let missing = extract_field::<Vec<u8>>(json!({ "data": {} }), "xs");
    assert!(matches!(missing, Err(ApiError::Parse(_))));
}

// =============================================================================
// bearer token
// =============================================================================

#[tokio::test]
async fn attaches_bearer_from_persisted_storage() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "persisted-token");
    transport.reply(Method::GET, "/dogs/favorites", 200, data(json!({ "favorites": [] })));

    client.list_favorites().await.unwrap();

    assert_eq!(transport.requests()[0].bearer.as_deref(), Some("persisted-token"));
}

#[tokio::test]
async fn sends_without_bearer_when_nothing_persisted() {
    let (client, transport, _storage) = mock_client();
    transport.reply(Method::GET, "/dogs/breeds", 200, data(json!({ "breeds": [] })));

    client.list_breeds(&BreedQuery::default()).await.unwrap();

    assert_eq!(transport.requests()[0].bearer, None);
}

#[tokio::test]
async fn explicit_bearer_wins_over_storage() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "stored");
    transport.reply(Method::POST, "/auth/logout", 200, json!({}));

    client.logout("captured").await.unwrap();

    assert_eq!(transport.requests()[0].bearer.as_deref(), Some("captured"));
}

// =============================================================================
// 401 safety net
// =============================================================================

#[tokio::test]
async fn unauthorized_response_clears_persisted_session_for_any_endpoint() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "stale");
    transport.reply(Method::POST, "/posts", 401, json!({ "message": "Token invalid" }));

    let err = client
        .create_post(&PostInput { title: "t".to_owned(), content: "c".repeat(12), tags: vec![] })
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.server_message(), Some("Token invalid"));
    assert_eq!(storage.get_item(SESSION_STORAGE_KEY), None);
}

#[tokio::test]
async fn later_requests_after_401_go_out_unauthenticated() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "stale");
    transport.reply(Method::GET, "/auth/profile", 401, json!({}));
    transport.reply(Method::GET, "/dogs/breeds", 200, data(json!({ "breeds": [] })));

    let _ = client.profile().await;
    client.list_breeds(&BreedQuery::default()).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].bearer.as_deref(), Some("stale"));
    assert_eq!(requests[1].bearer, None);
}

#[tokio::test]
async fn unauthorized_response_publishes_rejected_bearer() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "stale");
    transport.reply(Method::POST, "/dogs/favorites/b1", 401, json!({}));
    let mut rejections = client.rejections();
    assert_eq!(client.rejected_token(), None);

    client.add_favorite("b1").await.unwrap_err();

    assert!(rejections.has_changed().unwrap());
    assert_eq!(rejections.borrow_and_update().as_deref(), Some("stale"));
    assert_eq!(client.rejected_token().as_deref(), Some("stale"));
}

#[tokio::test]
async fn non_401_errors_keep_persisted_session() {
    let (client, transport, storage) = mock_client();
    seed_session(storage.as_ref(), user("u1", Role::User), "tok");
    transport.reply(Method::GET, "/auth/profile", 503, json!({ "message": "maintenance" }));

    let err = client.profile().await.unwrap_err();

    assert!(matches!(err, ApiError::Server { status: 503, .. }));
    assert!(storage.get_item(SESSION_STORAGE_KEY).is_some());
}

#[tokio::test]
async fn transport_failure_propagates() {
    let (client, transport, _storage) = mock_client();
    transport.fail(Method::GET, "/posts", "connection refused");
    let err = client.list_posts(&Default::default()).await.unwrap_err();
    assert_eq!(err, ApiError::Transport("connection refused".to_owned()));
}

// =============================================================================
// typed endpoints
// =============================================================================

#[tokio::test]
async fn login_posts_credentials_and_decodes_payload() {
    let (client, transport, _storage) = mock_client();
    transport.reply(
        Method::POST,
        "/auth/login",
        200,
        data(json!({ "user": { "id": "u1", "role": "user" }, "token": "t1" })),
    );

    let payload = client
        .login(&Credentials { email: "a@b.com".to_owned(), password: "secret1".to_owned() })
        .await
        .unwrap();

    assert_eq!(payload.user.id, "u1");
    assert_eq!(payload.token, "t1");
    assert_eq!(transport.requests()[0].body, Some(json!({ "email": "a@b.com", "password": "secret1" })));
}

#[tokio::test]
async fn list_breeds_sends_query_and_reads_pagination() {
    let (client, transport, _storage) = mock_client();
    transport.reply(
        Method::GET,
        "/dogs/breeds",
        200,
        data(json!({
            "breeds": [{ "_id": "b1", "name": "Beagle" }],
            "pagination": { "page": 1, "limit": 20, "total": 1, "pages": 1 }
        })),
    );

    let page = client
        .list_breeds(&BreedQuery { size: Some(BreedSize::Small), ..BreedQuery::default() })
        .await
        .unwrap();

    assert_eq!(page.breeds.len(), 1);
    assert_eq!(page.pagination.map(|p| p.total), Some(1));
    assert_eq!(transport.requests()[0].query, vec![("size".to_owned(), "small".to_owned())]);
}

#[tokio::test]
async fn list_favorites_accepts_documents_and_bare_ids() {
    let (client, transport, _storage) = mock_client();
    transport.reply(
        Method::GET,
        "/dogs/favorites",
        200,
        data(json!({ "favorites": [{ "_id": "b1", "name": "Beagle" }, "b2", 7] })),
    );

    let ids = client.list_favorites().await.unwrap();

    assert_eq!(ids, vec!["b1".to_owned(), "b2".to_owned()]);
}

#[tokio::test]
async fn admin_users_read_without_data_envelope() {
    let (client, transport, _storage) = mock_client();
    transport.reply(Method::GET, "/admin/users", 200, json!({ "users": [{ "_id": "u2", "role": "moderator" }] }));
    transport.reply(Method::PATCH, "/admin/users/u2/role", 200, json!({ "user": { "_id": "u2", "role": "admin" } }));

    let users = client.list_users().await.unwrap();
    let updated = client.update_user_role("u2", Role::Admin).await.unwrap();

    assert_eq!(users[0].role, Role::Moderator);
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(transport.requests()[1].body, Some(json!({ "role": "admin" })));
}

#[tokio::test]
async fn ids_are_encoded_as_single_path_segments() {
    let (client, transport, _storage) = mock_client();

    client.delete_breed("b1/../admin").await.unwrap_err();
    client.delete_comment("p 1", "c?9").await.unwrap_err();

    assert_eq!(
        transport.calls(),
        vec!["DELETE /dogs/breeds/b1%2F..%2Fadmin", "DELETE /posts/p%201/comments/c%3F9"]
    );
}

#[tokio::test]
async fn comment_routes_use_nested_paths() {
    let (client, transport, _storage) = mock_client();
    transport.reply(Method::POST, "/posts/p1/comments", 201, json!({}));
    transport.reply(Method::DELETE, "/posts/p1/comments/c9", 200, json!({}));

    client.add_comment("p1", "Lovely dog").await.unwrap();
    client.delete_comment("p1", "c9").await.unwrap();

    assert_eq!(transport.calls(), vec!["POST /posts/p1/comments", "DELETE /posts/p1/comments/c9"]);
    assert_eq!(transport.requests()[0].body, Some(json!({ "content": "Lovely dog" })));
}

#[tokio::test]
async fn malformed_success_body_is_a_parse_error() {
    let (client, transport, _storage) = mock_client();
    transport.reply(Method::GET, "/dogs/breeds/b1", 200, data(json!({ "breed": { "name": 3 } })));
    assert!(matches!(client.get_breed("b1").await, Err(ApiError::Parse(_))));
}
