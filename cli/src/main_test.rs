use super::*;

use std::collections::HashMap;
use std::sync::Mutex;

use pawpedia_client::net::transport::{ApiRequest, ApiResponse, Transport};
use pawpedia_client::storage::{self, PersistedSession};
use pawpedia_client::{ApiClient, MemoryStorage};

/// Answers each `"METHOD /path"` with a fixed reply and records every call.
#[derive(Default)]
struct FixedTransport {
    replies: HashMap<String, (u16, serde_json::Value)>,
    calls: Mutex<Vec<String>>,
}

impl FixedTransport {
    fn with(mut self, route: &str, status: u16, body: serde_json::Value) -> Self {
        self.replies.insert(route.to_owned(), (status, body));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for FixedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let key = format!("{} {}", request.method.as_str(), request.path);
        self.calls.lock().unwrap().push(key.clone());
        let (status, body) = self.replies.get(&key).cloned().unwrap_or((404, json!({})));
        Ok(ApiResponse::new(status, body))
    }
}

async fn signed_in_app(transport: Arc<FixedTransport>) -> AppState {
    let storage = Arc::new(MemoryStorage::new());
    let user = json!({ "_id": "u1", "firstName": "Ada", "role": "user" });
    storage::save_session(
        storage.as_ref(),
        &PersistedSession {
            user: Some(serde_json::from_value(user).unwrap()),
            token: Some("tok".to_owned()),
            is_authenticated: true,
        },
    )
    .unwrap();
    let app = AppState::new(ApiClient::new(transport, storage));
    app.start().await;
    app
}

#[test]
fn parses_breed_list_with_filters() {
    let cli = Cli::try_parse_from([
        "pawpedia",
        "--api-url",
        "http://localhost:5000/api",
        "breeds",
        "list",
        "--size",
        "small",
        "--activity-level",
        "very-high",
        "--page",
        "2",
    ])
    .unwrap();

    assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000/api"));
    let Command::Breeds(BreedsCommand { command: BreedsSubcommand::List(args) }) = cli.command else {
        panic!("expected breeds list");
    };
    let query = breed_query(&args);
    assert_eq!(query.size, Some(BreedSize::Small));
    assert_eq!(query.activity_level, Some(ActivityLevel::VeryHigh));
    assert_eq!(query.page, Some(2));
    assert_eq!(query.search, None);
}

#[test]
fn rejects_unknown_size() {
    let err = Cli::try_parse_from(["pawpedia", "breeds", "list", "--size", "giant"]).unwrap_err();
    assert!(err.to_string().contains("unknown size"));
}

#[test]
fn parses_admin_set_role() {
    let cli = Cli::try_parse_from(["pawpedia", "admin", "set-role", "u7", "moderator"]).unwrap();
    let Command::Admin(AdminCommand { command: AdminSubcommand::SetRole { user_id, role } }) = cli.command else {
        panic!("expected admin set-role");
    };
    assert_eq!(user_id, "u7");
    assert_eq!(role, Role::Moderator);
}

#[test]
fn post_create_tags_default_to_empty() {
    let cli = Cli::try_parse_from([
        "pawpedia",
        "posts",
        "create",
        "--title",
        "Hello",
        "--content",
        "Long enough body",
    ])
    .unwrap();
    let Command::Posts(PostsCommand { command: PostsSubcommand::Create { tags, .. } }) = cli.command else {
        panic!("expected posts create");
    };
    assert!(tags.is_empty());
}

#[test]
fn explicit_state_dir_wins() {
    let dir = tempfile::tempdir().unwrap();
    let resolved = resolve_state_dir(Some(dir.path().to_path_buf())).unwrap();
    assert_eq!(resolved, dir.path());
}

#[test]
fn breed_payload_is_checked_before_sending() {
    let input = parse_breed_input(r#"{"name":"Beagle","characteristics":{"size":"small"}}"#).unwrap();
    assert_eq!(input.characteristics.size, Some(BreedSize::Small));

    let err = parse_breed_input(r#"{"name":"  "}"#).unwrap_err();
    assert_eq!(err.to_string(), "Breed name is required");

    let err = parse_breed_input(r#"{"name":"X","characteristics":{"size":"giant"}}"#).unwrap_err();
    assert_eq!(err.to_string(), "Size must be small, medium or large");

    assert!(matches!(parse_breed_input("{"), Err(CliError::InvalidJson(_))));
}

#[test]
fn signed_out_session_has_no_current_user() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(Some("http://127.0.0.1:9/api"), Some(dir.path().to_path_buf())).unwrap();
    assert!(matches!(current_user(&app), Err(CliError::NotSignedIn)));
}

#[tokio::test]
async fn favorite_toggle_stops_when_current_set_cannot_be_loaded() {
    let transport = Arc::new(
        FixedTransport::default()
            .with("GET /auth/profile", 200, json!({ "data": { "user": { "_id": "u1", "role": "user" } } }))
            .with("GET /dogs/favorites", 503, json!({ "message": "maintenance" })),
    );
    let app = signed_in_app(transport.clone()).await;

    let command = Command::Favorites(FavoritesCommand {
        command: FavoritesSubcommand::Toggle { breed_id: "b1".to_owned() },
    });
    let err = run(&app, command).await.unwrap_err();

    assert_eq!(err.to_string(), "Unable to load favorites");
    assert_eq!(transport.calls(), vec!["GET /auth/profile", "GET /dogs/favorites"]);
    assert!(app.notifications.drain().is_empty());
}

#[tokio::test]
async fn favorite_toggle_removes_breed_already_listed() {
    let transport = Arc::new(
        FixedTransport::default()
            .with("GET /auth/profile", 200, json!({ "data": { "user": { "_id": "u1", "role": "user" } } }))
            .with("GET /dogs/favorites", 200, json!({ "data": { "favorites": ["b1"] } }))
            .with("DELETE /dogs/favorites/b1", 200, json!({})),
    );
    let app = signed_in_app(transport.clone()).await;

    let command = Command::Favorites(FavoritesCommand {
        command: FavoritesSubcommand::Toggle { breed_id: "b1".to_owned() },
    });
    run(&app, command).await.unwrap();

    assert_eq!(transport.calls().last().map(String::as_str), Some("DELETE /dogs/favorites/b1"));
    assert!(!app.favorites.is_favorite("b1"));
}
