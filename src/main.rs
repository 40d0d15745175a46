use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use lingo_practice::api::{extract_translation, Credentials};
use lingo_practice::session::LOGIN_ROUTE;
use lingo_practice::{
    capture_voice_answer, AnswerDraft, ApiClient, ApiError, Config, Navigator, ScriptedHost,
    SessionManager, SpeechConfig, StyleVariation, TokenClaims,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lingo-practice", version, about = "Japanese to English translation practice")]
struct Cli {
    /// Config file path, without extension
    #[arg(long, env = "LINGO_CONFIG", default_value = "config/lingo-practice")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the access token
    Login(CredentialArgs),
    /// Create an account and store the access token
    Register(CredentialArgs),
    /// Forget the stored access token
    Logout,
    /// Show authentication state
    Status,
    /// Answer a freshly generated question
    Question {
        #[command(flatten)]
        answer: AnswerArgs,
        /// Toggle the question's favorite flag afterwards
        #[arg(long)]
        favorite: bool,
    },
    /// Translate Japanese text with an explanation
    Translate {
        text: String,
        /// formal, casual or context:<situation>
        #[arg(long)]
        style: Option<StyleVariation>,
        /// Save the result to the review list
        #[arg(long)]
        save: bool,
    },
    /// Practise a saved question
    Review {
        #[arg(long, default_value_t = 0)]
        index: usize,
        #[command(flatten)]
        answer: AnswerArgs,
    },
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "LINGO_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct AnswerArgs {
    /// Typed answer; prompts on stdin when neither this nor a voice script is given
    #[arg(long, conflicts_with = "voice_script")]
    answer: Option<String>,
    /// Recorded recognition events (JSON lines) to answer by voice
    #[arg(long)]
    voice_script: Option<PathBuf>,
    /// Recognition language override
    #[arg(long)]
    language: Option<String>,
}

/// Terminal stand-in for the login view
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate(&self, route: &str) {
        if route == LOGIN_ROUTE {
            eprintln!("Signed out. Run `lingo-practice login` to sign in again.");
        } else {
            info!("Navigation requested: {}", route);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    let session = Arc::new(SessionManager::with_token_key(
        cfg.session.open_storage(),
        Arc::new(CliNavigator),
        cfg.session.token_key.clone(),
    ));
    session.check_auth();

    let api = ApiClient::new(cfg.api.base_url.clone(), cfg.api.timeout_ms, Arc::clone(&session))
        .context("Failed to create API client")?;

    let result = run(cli.command, &api, &session, &cfg.speech).await;

    if let Err(e) = &result {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            session.handle_unauthorized();
        }
    }

    result
}

async fn run(
    command: Command,
    api: &ApiClient,
    session: &SessionManager,
    speech: &SpeechConfig,
) -> Result<()> {
    match command {
        Command::Login(args) => {
            let token = match api.login(&args.credentials()).await {
                Err(ApiError::Unauthorized) => bail!("Incorrect email or password"),
                other => other?,
            };
            session
                .try_login(&token.access_token)
                .context("Failed to save token")?;
            println!("Logged in as {}", args.email);
        }
        Command::Register(args) => {
            let token = api.register(&args.credentials()).await?;
            session
                .try_login(&token.access_token)
                .context("Failed to save token")?;
            println!("Registered and logged in as {}", args.email);
        }
        Command::Logout => session.logout(),
        Command::Status => print_status(api, session).await?,
        Command::Question { answer, favorite } => {
            require_auth(session)?;

            let question = api.generate_question().await?;
            println!("Question #{}: {}", question.id, question.japanese_text);

            if let Some(text) = resolve_answer(&answer, speech).await? {
                let feedback = api.check_answer(question.id, &text).await?;
                println!("\nYour answer: {}\n\n{}", text, feedback.feedback);
            }

            if favorite {
                let status = api.toggle_favorite(question.id).await?;
                println!(
                    "{}",
                    if status.is_favorite {
                        "Added to favorites"
                    } else {
                        "Removed from favorites"
                    }
                );
            }
        }
        Command::Translate { text, style, save } => {
            require_auth(session)?;
            if text.trim().is_empty() {
                bail!("Nothing to translate");
            }

            let resp = api.translate(&text).await?;
            let mut translation = extract_translation(&resp.translation);
            println!("{}", translation);
            if !resp.explanation.is_empty() {
                println!("\n{}", resp.explanation);
            }

            if let Some(style) = style {
                let variant = api.style_variation(&text, &translation, &style).await?;
                translation = extract_translation(&variant.translation);
                println!("\n[{}] {}", style, translation);
                if !variant.explanation.is_empty() {
                    println!("\n{}", variant.explanation);
                }
            }

            if save {
                api.save_favorite(&text, &translation).await?;
                println!("Saved to the review list");
            }
        }
        Command::Review { index, answer } => {
            require_auth(session)?;

            let questions = api.favorites().await?;
            if questions.is_empty() {
                println!("No saved questions yet");
                return Ok(());
            }
            let Some(question) = questions.get(index) else {
                bail!(
                    "No saved question at index {} ({} saved)",
                    index,
                    questions.len()
                );
            };

            println!(
                "Review {}/{}: {}",
                index + 1,
                questions.len(),
                question.japanese_text
            );

            if let Some(text) = resolve_answer(&answer, speech).await? {
                let feedback = api.check_review_answer(question, &text).await?;
                println!("\nYour answer: {}\n\n{}", text, feedback.feedback);
            }
            if !question.english_answer.is_empty() {
                println!("\nModel answer: {}", question.english_answer);
            }
        }
    }

    Ok(())
}

impl CredentialArgs {
    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

fn require_auth(session: &SessionManager) -> Result<()> {
    if !session.is_authenticated() {
        bail!("Not logged in. Run `lingo-practice login` first.");
    }
    Ok(())
}

async fn print_status(api: &ApiClient, session: &SessionManager) -> Result<()> {
    let snapshot = session.snapshot();
    println!("Authenticated: {}", snapshot.is_authenticated);

    let Some(token) = snapshot.token else {
        return Ok(());
    };

    if let Some(claims) = TokenClaims::decode(&token) {
        if let Some(sub) = &claims.sub {
            println!("Token subject: {}", sub);
        }
        if let Some(at) = claims.expires_at() {
            let state = if claims.is_expired(Utc::now()) {
                "expired"
            } else {
                "valid"
            };
            println!("Token expires: {} ({})", at.to_rfc3339(), state);
        }
    }

    let profile = api.me().await?;
    println!("Server user: {}", profile.email);
    Ok(())
}

async fn resolve_answer(args: &AnswerArgs, speech: &SpeechConfig) -> Result<Option<String>> {
    if let Some(text) = &args.answer {
        let mut draft = AnswerDraft::new();
        draft.set_typed(text);
        return Ok(draft.into_answer());
    }

    if let Some(script) = &args.voice_script {
        let host = ScriptedHost::from_file(script)?;
        let mut config = speech.clone();
        if let Some(language) = &args.language {
            config.language = language.clone();
        }
        return capture_voice_answer(&host, config).await;
    }

    print!("Your answer (empty to skip): ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read answer")?;

    let mut draft = AnswerDraft::new();
    draft.set_typed(&line);
    Ok(draft.into_answer())
}
