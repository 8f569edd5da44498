use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use flapper_news::config::ClientConfig;
use flapper_news::error::{ApiError, AuthError, ConfigError, NavigationError, PageError};
use flapper_news::net::types::Credentials;
use flapper_news::pages::nav::NavBar;
use flapper_news::router::{Route, Router, View};
use flapper_news::state::Session;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Parser, Debug)]
#[command(name = "flapper", about = "Flapper News forum client")]
struct Cli {
    /// Backend base URL; overrides FLAPPER_BASE_URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Directory holding the persisted token; overrides FLAPPER_TOKEN_DIR.
    #[arg(long)]
    token_dir: Option<PathBuf>,

    /// Log requests and navigation to stderr.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Navigate to a URL path (e.g. /home, /posts/{id}) and render it.
    Open { path: String },
    Posts(PostsCommand),
    Comments(CommentsCommand),
    Register(CredentialArgs),
    Login(CredentialArgs),
    Logout,
    Whoami,
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List,
    Show {
        post_id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        link: String,
    },
    Upvote {
        post_id: String,
    },
    Downvote {
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
        body: String,
    },
    Upvote {
        post_id: String,
        comment_id: String,
    },
    Downvote {
        post_id: String,
        comment_id: String,
    },
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "FLAPPER_PASSWORD", hide_env_values = true)]
    password: String,
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Self { username: args.username, password: args.password }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(token_dir) = cli.token_dir {
        config = config.with_token_dir(token_dir);
    }
    tracing::debug!(base_url = %config.base_url, token = %config.token_path().display(), "client configured");

    let mut session = Session::from_config(&config)?;
    let mut router = Router::new();

    match cli.command {
        Command::Open { path } => {
            let view = router.go_to_path(&mut session, &path).await?;
            print!("{}", view.render(&session));
            Ok(())
        }
        Command::Posts(posts) => run_posts(&mut session, &mut router, posts).await,
        Command::Comments(comments) => run_comments(&mut session, &mut router, comments).await,
        Command::Register(args) => run_auth(&mut session, &mut router, Route::Register, args.into()).await,
        Command::Login(args) => run_auth(&mut session, &mut router, Route::Login, args.into()).await,
        Command::Logout => {
            let nav = NavBar::new(&session);
            nav.log_out()?;
            print!("{}", nav.render());
            Ok(())
        }
        Command::Whoami => {
            print!("{}", NavBar::new(&session).render());
            Ok(())
        }
    }
}

async fn run_posts(session: &mut Session, router: &mut Router, posts: PostsCommand) -> Result<(), CliError> {
    if let PostsSubcommand::Show { post_id } = &posts.command {
        let page = router.post(session, post_id).await?;
        print!("{}", page.render(session));
        return Ok(());
    }

    let mut page = router.home(session).await?;
    match posts.command {
        PostsSubcommand::List | PostsSubcommand::Show { .. } => {}
        PostsSubcommand::Create { title, link } => {
            page.title = title;
            page.link = link;
            page.add_post(session).await?;
        }
        PostsSubcommand::Upvote { post_id } => page.upvote(session, &post_id).await,
        PostsSubcommand::Downvote { post_id } => page.downvote(session, &post_id).await,
    }
    print!("{}", page.render(session));
    Ok(())
}

async fn run_comments(session: &mut Session, router: &mut Router, comments: CommentsCommand) -> Result<(), CliError> {
    match comments.command {
        CommentsSubcommand::Add { post_id, body } => {
            let mut page = router.post(session, &post_id).await?;
            page.body = body;
            page.add_comment(session).await?;
            print!("{}", page.render(session));
        }
        CommentsSubcommand::Upvote { post_id, comment_id } => {
            let mut page = router.post(session, &post_id).await?;
            page.upvote(session, &comment_id).await;
            print!("{}", page.render(session));
        }
        CommentsSubcommand::Downvote { post_id, comment_id } => {
            let mut page = router.post(session, &post_id).await?;
            page.downvote(session, &comment_id).await;
            print!("{}", page.render(session));
        }
    }
    Ok(())
}

async fn run_auth(
    session: &mut Session,
    router: &mut Router,
    route: Route,
    credentials: Credentials,
) -> Result<(), CliError> {
    let mut page = match router.go(session, route).await? {
        View::Login(page) | View::Register(page) => page,
        landed => {
            print!("{}", NavBar::new(session).render());
            print!("{}", landed.render(session));
            return Ok(());
        }
    };

    page.user = credentials;
    let Some(next) = page.submit(session).await else {
        print!("{}", page.render());
        return Err(CliError::Rejected(page.error.unwrap_or_else(|| "authentication failed".to_owned())));
    };

    let view = router.go(session, next).await?;
    print!("{}", NavBar::new(session).render());
    print!("{}", view.render(session));
    Ok(())
}
