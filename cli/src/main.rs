use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use pawpedia_client::config::ConfigError;
use pawpedia_client::net::types::{
    ActivityLevel, BreedInput, BreedQuery, BreedSize, Credentials, PostQuery, ProfileUpdate, RegisterRequest, Role,
    User,
};
use pawpedia_client::state::ActionError;
use pawpedia_client::state::breeds::BreedFiltersPatch;
use pawpedia_client::state::favorites::FavoriteError;
use pawpedia_client::state::notifications::{NotificationCenter, Notifier, Severity};
use pawpedia_client::state::posts::PostFilters;
use pawpedia_client::storage::StorageError;
use pawpedia_client::util::validation::{self, FormErrors, PostForm};
use pawpedia_client::{ApiError, AppState, ClientConfig, FileStorage};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("client setup failed: {0}")]
    Client(#[from] ApiError),
    #[error("{0}")]
    Action(#[from] ActionError),
    #[error("{0}")]
    Favorite(#[from] FavoriteError),
    #[error("{}", .0.summary())]
    Invalid(FormErrors),
    #[error("not signed in; run `pawpedia login` first")]
    NotSignedIn,
    #[error("no config directory found; pass --state-dir or set PAWPEDIA_STATE_DIR")]
    NoStateDir,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pawpedia", about = "Pawpedia dog-breed encyclopedia client")]
struct Cli {
    /// Backend base URL, e.g. http://localhost:5000/api
    #[arg(long, env = "PAWPEDIA_API_URL")]
    api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, env = "PAWPEDIA_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PAWPEDIA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    Whoami,
    Profile(ProfileCommand),
    Breeds(BreedsCommand),
    Favorites(FavoritesCommand),
    Posts(PostsCommand),
    Comments(CommentsCommand),
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "PAWPEDIA_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to --password
    #[arg(long)]
    confirm_password: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

#[derive(Args, Debug)]
struct BreedsCommand {
    #[command(subcommand)]
    command: BreedsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BreedsSubcommand {
    List(BreedListArgs),
    Show {
        breed_id: String,
    },
    Create {
        /// Breed document as JSON
        #[arg(long)]
        data: String,
    },
    Update {
        breed_id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        breed_id: String,
    },
}

#[derive(Args, Debug, Default)]
struct BreedListArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    /// Server-side search
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    size: Option<BreedSize>,
    #[arg(long)]
    activity_level: Option<ActivityLevel>,
    /// Narrow the fetched page by name, locally
    #[arg(long)]
    name_contains: Option<String>,
}

#[derive(Args, Debug)]
struct FavoritesCommand {
    #[command(subcommand)]
    command: FavoritesSubcommand,
}

#[derive(Subcommand, Debug)]
enum FavoritesSubcommand {
    List,
    Toggle { breed_id: String },
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        tag: Option<String>,
        /// Narrow the fetched posts by title or content, locally
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        post_id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Comma-separated
        #[arg(long, default_value = "")]
        tags: String,
    },
    Update {
        post_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    Delete {
        post_id: String,
    },
}

#[derive(Args, Debug)]
struct CommentsCommand {
    #[command(subcommand)]
    command: CommentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentsSubcommand {
    Add {
        post_id: String,
        #[arg(long)]
        content: String,
    },
    Delete {
        post_id: String,
        comment_id: String,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Users,
    SetRole { user_id: String, role: Role },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("warning: ignoring unreadable .env: {error}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = build_app(cli.api_url.as_deref(), cli.state_dir)?;
    app.start().await;

    let result = run(&app, cli.command).await;
    flush_notifications(&app.notifications);
    result
}

fn build_app(api_url: Option<&str>, state_dir: Option<PathBuf>) -> Result<AppState, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = api_url {
        config = config.with_api_url(api_url)?;
    }
    let dir = resolve_state_dir(state_dir)?;
    tracing::debug!(api_url = %config.api_url, state_dir = %dir.display(), "starting");
    let storage = FileStorage::open(dir)?;
    Ok(AppState::from_config(&config, Arc::new(storage))?)
}

fn resolve_state_dir(explicit: Option<PathBuf>) -> Result<PathBuf, CliError> {
    explicit
        .or_else(|| dirs::config_dir().map(|dir| dir.join("pawpedia")))
        .ok_or(CliError::NoStateDir)
}

async fn run(app: &AppState, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => run_login(app, email, password).await,
        Command::Register(args) => run_register(app, args).await,
        Command::Logout => {
            if let Some(handle) = app.logout() {
                if let Err(error) = handle.await {
                    tracing::debug!(%error, "logout task did not finish");
                }
            }
            app.notifications.info("Signed out");
            Ok(())
        }
        Command::Whoami => print_json(&current_user(app)?),
        Command::Profile(profile) => run_profile(app, profile).await,
        Command::Breeds(breeds) => run_breeds(app, breeds).await,
        Command::Favorites(favorites) => run_favorites(app, favorites).await,
        Command::Posts(posts) => run_posts(app, posts).await,
        Command::Comments(comments) => run_comments(app, comments).await,
        Command::Admin(admin) => run_admin(app, admin).await,
    }
}

async fn run_login(app: &AppState, email: String, password: String) -> Result<(), CliError> {
    let credentials = Credentials { email, password };
    validation::validate_login_form(&credentials)
        .into_result()
        .map_err(CliError::Invalid)?;
    app.session.login(&credentials.email, &credentials.password).await?;
    let user = current_user(app)?;
    app.notifications.success(&format!("Welcome, {}", user.display_name()));
    print_json(&user)
}

async fn run_register(app: &AppState, args: RegisterArgs) -> Result<(), CliError> {
    let request = RegisterRequest {
        confirm_password: args.confirm_password.unwrap_or_else(|| args.password.clone()),
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        password: args.password,
    };
    validation::validate_register_form(&request)
        .into_result()
        .map_err(CliError::Invalid)?;
    let strength = validation::password_strength(&request.password);
    if strength.score < 3 {
        app.notifications.warning(&format!("Password strength: {}", strength.label));
    }
    app.session.register(&request).await?;
    app.notifications.success("Account created");
    print_json(&current_user(app)?)
}

async fn run_profile(app: &AppState, profile: ProfileCommand) -> Result<(), CliError> {
    current_user(app)?;
    match profile.command {
        ProfileSubcommand::Update { first_name, last_name, email, bio } => {
            let update = ProfileUpdate { first_name, last_name, email, bio };
            let user = app.session.update_profile(&update).await?;
            app.notifications.success("Profile updated");
            print_json(&user)
        }
    }
}

async fn run_breeds(app: &AppState, breeds: BreedsCommand) -> Result<(), CliError> {
    match breeds.command {
        BreedsSubcommand::List(args) => {
            app.breeds.fetch_breeds(breed_query(&args)).await?;
            if let Some(name) = args.name_contains {
                app.breeds.set_filters(BreedFiltersPatch { search: Some(name), ..BreedFiltersPatch::default() });
            }
            let pagination = app.breeds.state().with(|s| s.pagination);
            print_json(&json!({ "breeds": app.breeds.filtered(), "pagination": pagination }))
        }
        BreedsSubcommand::Show { breed_id } => {
            let breed = app.breeds.fetch_breed_by_id(&breed_id).await?;
            print_json(&breed)
        }
        BreedsSubcommand::Create { data } => {
            let input = parse_breed_input(&data)?;
            app.breeds.create_breed(&input).await?;
            app.notifications.success(&format!("Breed {} created", input.name));
            Ok(())
        }
        BreedsSubcommand::Update { breed_id, data } => {
            let input = parse_breed_input(&data)?;
            app.breeds.update_breed(&breed_id, &input).await?;
            app.notifications.success(&format!("Breed {} updated", input.name));
            Ok(())
        }
        BreedsSubcommand::Delete { breed_id } => {
            app.breeds.delete_breed(&breed_id).await?;
            app.notifications.success("Breed deleted");
            Ok(())
        }
    }
}

fn breed_query(args: &BreedListArgs) -> BreedQuery {
    BreedQuery {
        page: args.page,
        limit: args.limit,
        search: args.search.clone(),
        size: args.size,
        activity_level: args.activity_level,
    }
}

fn parse_breed_input(data: &str) -> Result<BreedInput, CliError> {
    let input = serde_json::from_str::<BreedInput>(data)?;
    validation::validate_breed_input(&input)
        .into_result()
        .map_err(CliError::Invalid)?;
    Ok(input)
}

async fn run_favorites(app: &AppState, favorites: FavoritesCommand) -> Result<(), CliError> {
    current_user(app)?;
    match favorites.command {
        FavoritesSubcommand::List => {
            load_favorites(app).await?;
            print_json(&app.favorites.state().with(|s| s.favorite_ids.clone()))
        }
        FavoritesSubcommand::Toggle { breed_id } => {
            // Toggling against an unknown set would pick the wrong direction.
            load_favorites(app).await?;
            let favorite = app.favorites.toggle_favorite(&breed_id).await?;
            let message = if favorite { "Added to favorites" } else { "Removed from favorites" };
            app.notifications.success(message);
            print_json(&json!({ "breedId": breed_id, "favorite": favorite }))
        }
    }
}

async fn load_favorites(app: &AppState) -> Result<(), CliError> {
    app.favorites.fetch_favorites().await;
    match app.favorites.state().with(|s| s.error.clone()) {
        Some(message) => Err(ActionError::Rejected(message).into()),
        None => Ok(()),
    }
}

async fn run_posts(app: &AppState, posts: PostsCommand) -> Result<(), CliError> {
    match posts.command {
        PostsSubcommand::List { page, limit, tag, search } => {
            app.posts.fetch_posts(PostQuery { page, limit, tag }).await?;
            if let Some(search) = search {
                app.posts.set_filters(PostFilters { search, tag: None });
            }
            print_json(&app.posts.filtered())
        }
        PostsSubcommand::Show { post_id } => {
            let post = app.posts.fetch_post(&post_id).await?;
            print_json(&post)
        }
        PostsSubcommand::Create { title, content, tags } => {
            app.posts.create_post(&PostForm { title, content, tags }).await?;
            app.notifications.success("Post published");
            Ok(())
        }
        PostsSubcommand::Update { post_id, title, content, tags } => {
            let current = app.posts.fetch_post(&post_id).await?;
            let mut form = PostForm::from_post(&current.title, &current.content, &current.tags);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(content) = content {
                form.content = content;
            }
            if let Some(tags) = tags {
                form.tags = tags;
            }
            app.posts.update_post(&post_id, &form).await?;
            app.notifications.success("Post updated");
            Ok(())
        }
        PostsSubcommand::Delete { post_id } => {
            app.posts.delete_post(&post_id).await?;
            app.notifications.success("Post deleted");
            Ok(())
        }
    }
}

async fn run_comments(app: &AppState, comments: CommentsCommand) -> Result<(), CliError> {
    match comments.command {
        CommentsSubcommand::Add { post_id, content } => {
            app.posts.add_comment(&post_id, &content).await?;
            app.notifications.success("Comment added");
        }
        CommentsSubcommand::Delete { post_id, comment_id } => {
            app.posts.delete_comment(&post_id, &comment_id).await?;
            app.notifications.success("Comment deleted");
        }
    }
    let post = app.posts.state().with(|s| s.selected_post.clone());
    print_json(&post)
}

async fn run_admin(app: &AppState, admin: AdminCommand) -> Result<(), CliError> {
    let actor = current_user(app)?;
    match admin.command {
        AdminSubcommand::Users => {
            app.users.fetch_users(&actor).await?;
            print_json(&app.users.state().with(|s| s.users.clone()))
        }
        AdminSubcommand::SetRole { user_id, role } => {
            let updated = app.users.update_role(&actor, &user_id, role).await?;
            app.notifications.success(&format!("{} is now {}", updated.display_name(), role.label()));
            print_json(&updated)
        }
    }
}

fn current_user(app: &AppState) -> Result<User, CliError> {
    let session = app.session.snapshot();
    if !session.is_live() {
        return Err(CliError::NotSignedIn);
    }
    session.user.ok_or(CliError::NotSignedIn)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn flush_notifications(center: &NotificationCenter) {
    for notification in center.drain() {
        let tag = match notification.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        eprintln!("[{tag}] {}", notification.message);
    }
}
