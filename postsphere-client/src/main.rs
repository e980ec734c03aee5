use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use postsphere::api::{ApiClient, Thumbnail};
use postsphere::app::{FeedController, PostComposer, PostDetailController, PostDraft, ProfileController};
use postsphere::auth::{AuthService, PasswordReset};
use postsphere::config::{describe_server, ConfigManager};
use postsphere::error::ClientError;
use postsphere::format::{avatar_url, format_post_date, html_to_text, like_label, thumbnail_src, wrap_text};
use postsphere::logging::{self, LogConfig};
use postsphere::session::SessionHandle;
use postsphere::storage::StorageAdapterFactory;
use postsphere::validation::SignupForm;
use postsphere_types::{CommentId, Post, PostId, SortMode, UserId};

const TEXT_WIDTH: usize = 80;

/// PostSphere - read, write and discuss blog posts from the terminal
#[derive(Parser)]
#[command(name = "postsphere")]
#[command(about = "Command-line client for the PostSphere blogging platform")]
#[command(version)]
struct Cli {
    /// Server API URL (overrides POSTSPHERE_SERVER_URL and the saved config)
    #[arg(long, short)]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,

    /// Keep the session in memory only
    #[arg(long)]
    no_persist: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long, env = "POSTSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Log in and remember the session
    Login {
        username: String,
        #[arg(long, env = "POSTSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List posts
    Feed {
        /// recommended, most-liked or latest
        #[arg(long, default_value = "recommended", value_parser = parse_sort_mode)]
        sort: SortMode,
        /// Only posts whose title or intro contains this text
        #[arg(long, short, default_value = "")]
        query: String,
    },
    /// People you may know
    People,
    /// Show a post with its comments
    Show {
        post_id: PostId,
        /// Also list other posts by the same author
        #[arg(long)]
        related: bool,
    },
    /// Like or unlike a post
    Like { post_id: PostId },
    /// Comment on a post
    Comment { post_id: PostId, text: String },
    /// Delete one of your comments
    DeleteComment { post_id: PostId, comment_id: CommentId },
    /// Publish a new post
    Post {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        intro: String,
        /// File holding the post body as HTML
        #[arg(long)]
        body_file: PathBuf,
        /// Image to use as the thumbnail
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    /// List a user's posts (yours by default)
    Profile { user_id: Option<UserId> },
    /// Delete one of your posts
    DeletePost { post_id: PostId },
    /// Email a password reset code
    ForgotPassword { email: String },
    /// Set a new password using the emailed code
    ResetPassword {
        email: String,
        code: String,
        #[arg(long, env = "POSTSPHERE_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Manage client configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the server URL used when --server is not given
    SetServer { url: String },
    /// Print the server URL in use
    Show,
}

fn parse_sort_mode(s: &str) -> Result<SortMode, String> {
    SortMode::parse(s).ok_or_else(|| {
        let choices: Vec<String> = SortMode::ALL.iter().map(|m| m.as_str().replace(' ', "-")).collect();
        format!("unknown sort mode '{}' (use one of: {})", s, choices.join(", "))
    })
}

// Load environment variables from .env file
fn load_env() {
    let _ = dotenv::dotenv();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing: --password falls back to POSTSPHERE_PASSWORD
    load_env();
    let cli = Cli::parse();

    let config = ConfigManager::new()?;

    let mut log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    log_config.log_file = config.config_dir().join("postsphere_debug.log");
    logging::init_logging(&log_config)?;

    let server_url = config.determine_server_url(cli.server.clone())?;
    log::info!("Using server {} ({})", server_url, describe_server(&server_url));

    let session = SessionHandle::new();
    let api_client = ApiClient::new(server_url, session);
    let auth = AuthService::new(
        api_client.clone(),
        StorageAdapterFactory::create_adapter(!cli.no_persist)?,
    );
    if let Err(e) = auth.restore_session() {
        log::warn!("Could not restore session: {}", e);
    }

    run(cli.command, &config, &api_client, &auth).await
}

async fn run(command: Command, config: &ConfigManager, api_client: &ApiClient, auth: &AuthService) -> Result<()> {
    match command {
        Command::Signup {
            username,
            email,
            bio,
            password,
            confirm,
        } => {
            let form = SignupForm {
                username,
                email,
                bio,
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                password,
            };
            let message = auth.signup(&form).await?;
            println!("{}", message);
        }
        Command::Login { username, password } => {
            let user = auth.login(&username, &password).await?;
            println!("Logged in as {}", user.username);
        }
        Command::Logout => {
            auth.logout()?;
            println!("Logged out");
        }
        Command::Whoami => match auth.current() {
            Some(session) => {
                println!("{} (id {})", session.user.username, session.user.id);
                println!("  email:  {}", session.user.email);
                if let Some(bio) = session.user.bio.as_deref().filter(|b| !b.is_empty()) {
                    println!("  bio:    {}", bio);
                }
                println!("  avatar: {}", avatar_url(&session.user.username));
            }
            None => println!("Not logged in"),
        },
        Command::Feed { sort, query } => {
            let mut feed = FeedController::new(api_client.clone());
            feed.load().await?;
            feed.set_sort_mode(sort);
            feed.set_query(query);

            println!("{} ({} of {} posts)", sort.label(), feed.visible().len(), feed.posts().len());
            if feed.visible().is_empty() {
                println!("No posts found");
            }
            for post in feed.visible() {
                print_post_summary(post, api_client.base_url());
            }
        }
        Command::People => {
            let mut feed = FeedController::new(api_client.clone());
            feed.load().await?;
            if feed.users().is_empty() && !api_client.session().is_authenticated() {
                println!("Log in to see people you may know");
            }
            for user in feed.users() {
                println!("{:<20} {}", user.username, avatar_url(&user.username));
            }
        }
        Command::Show { post_id, related } => {
            let mut detail = PostDetailController::new(api_client.clone(), post_id);
            detail.load().await?;
            print_post_detail(&detail, api_client.base_url());

            if related {
                let posts = detail.load_related().await?;
                println!();
                println!("More from this author:");
                if posts.is_empty() {
                    println!("  (none)");
                }
                for post in posts {
                    println!("  #{} {}", post.id, post.title);
                }
            }
        }
        Command::Like { post_id } => {
            let mut detail = PostDetailController::new(api_client.clone(), post_id);
            detail.load().await?;
            let status = detail.toggle_like().await?;
            let verb = if status.is_liked { "Liked" } else { "Unliked" };
            println!("{} post #{} ({})", verb, post_id, like_label(status.like_count));
        }
        Command::Comment { post_id, text } => {
            let mut detail = PostDetailController::new(api_client.clone(), post_id);
            detail.load().await?;
            detail.draft_comment = text;
            match detail.submit_draft().await {
                Ok(Some(comment)) => println!("Comment #{} added", comment.id),
                Ok(None) => println!("Nothing to post: the comment is empty"),
                Err(e) => {
                    eprintln!("Not sent: {}", detail.draft_comment);
                    return Err(e.into());
                }
            }
        }
        Command::DeleteComment { post_id, comment_id } => {
            let mut detail = PostDetailController::new(api_client.clone(), post_id);
            detail.load().await?;
            detail.delete_comment(comment_id).await?;
            println!("Comment #{} deleted", comment_id);
        }
        Command::Post {
            title,
            intro,
            body_file,
            thumbnail,
        } => {
            let body_html = std::fs::read_to_string(&body_file)
                .with_context(|| format!("Failed to read {}", body_file.display()))?;
            let thumbnail = thumbnail.map(Thumbnail::from_path).transpose()?;

            let composer = PostComposer::new(api_client.clone());
            let created = composer
                .submit_post(PostDraft {
                    title,
                    intro,
                    body_html,
                    thumbnail,
                })
                .await?;
            match created.post_id {
                Some(id) => println!("{} (post #{})", created.message, id),
                None => println!("{}", created.message),
            }
        }
        Command::Profile { user_id } => {
            let user_id = match user_id.or_else(|| api_client.session().user_id()) {
                Some(id) => id,
                None => return Err(ClientError::auth_required().into()),
            };
            let mut profile = ProfileController::new(api_client.clone());
            let posts = profile.load_owned_posts(user_id).await?;
            if posts.is_empty() {
                println!("No posts yet");
            }
            for post in posts {
                print_post_summary(post, api_client.base_url());
            }
        }
        Command::DeletePost { post_id } => {
            let mut profile = ProfileController::new(api_client.clone());
            profile.delete_post(post_id).await?;
            println!("Post #{} deleted", post_id);
        }
        Command::ForgotPassword { email } => {
            let mut reset = PasswordReset::new(api_client.clone());
            let message = reset.request_code(&email).await?;
            println!("{}", message);
            println!("Then run: postsphere reset-password {} <code>", email.trim());
        }
        Command::ResetPassword {
            email,
            code,
            password,
            confirm,
        } => {
            let mut reset = PasswordReset::awaiting(api_client.clone(), email.trim());
            let confirm = confirm.unwrap_or_else(|| password.clone());
            let message = reset.complete(&code, &password, &confirm).await?;
            println!("{}", message);
        }
        Command::Config { action } => match action {
            ConfigAction::SetServer { url } => {
                config.save_server_url(url.trim())?;
                println!("Server set to {} ({})", url.trim(), describe_server(&url));
            }
            ConfigAction::Show => {
                println!("{} ({})", api_client.base_url(), describe_server(api_client.base_url()));
            }
        },
    }

    Ok(())
}

fn print_post_summary(post: &Post, base_url: &str) {
    println!("#{} {}", post.id, post.title);
    println!(
        "    by {} on {} - {}",
        post.author.username,
        format_post_date(&post.created_at),
        like_label(post.like_count)
    );
    if !post.intro.trim().is_empty() {
        println!("    {}", post.intro.trim());
    }
    if let Some(src) = thumbnail_src(base_url, post.thumbnail_url.as_deref()) {
        println!("    thumbnail: {}", src);
    }
}

fn print_post_detail(detail: &PostDetailController, base_url: &str) {
    let Some(post) = detail.post() else {
        return;
    };
    let likes = detail.like_status();

    println!("{}", post.title);
    println!(
        "by {} ({}) on {}",
        post.author.username,
        avatar_url(&post.author.username),
        format_post_date(&post.created_at)
    );
    println!("{}", like_label(likes.like_count));
    if let Some(src) = thumbnail_src(base_url, post.thumbnail_url.as_deref()) {
        println!("thumbnail: {}", src);
    }
    if !post.intro.trim().is_empty() {
        println!();
        for line in wrap_text(post.intro.trim(), TEXT_WIDTH) {
            println!("{}", line);
        }
    }
    println!();
    for line in wrap_text(&html_to_text(&post.content), TEXT_WIDTH) {
        println!("{}", line);
    }

    println!();
    println!("Comments ({}):", detail.comments().len());
    for comment in detail.comments() {
        println!(
            "  [#{}] {} on {}: {}",
            comment.id,
            comment.author_username(),
            format_post_date(&comment.created_at),
            comment.content
        );
    }
}
