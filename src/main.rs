use std::sync::Arc;

use log::{LevelFilter, error, info};
use log4rs::{
    Config,
    append::{
        console::{ConsoleAppender, Target},
        rolling_file::{
            RollingFileAppender,
            policy::compound::{
                CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
            },
        },
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use tournament_auth_google::{GoogleIdentityProvider, GoogleOAuthConfig};
use tournament_persistence_sqlite::{
    create_db_pool, init_schema, matches::SqliteMatchRepository, users::SqliteUserRepository,
};
use tournament_server_api::{
    AppState,
    config::{ApiConfig, required_env},
    http,
    jwt::JwtSessionTokens,
    ws::WsService,
};
use tournament_server_app::build_application;

const LOG_SIZE_LIMIT: u64 = 10 * 1024 * 1024; // 10 MB

const LOG_FILE_COUNT: u32 = 3;

const DEFAULT_DATABASE_URL: &str = "sqlite://tournament.db";

type StartupError = Box<dyn std::error::Error>;

/// Logs to stderr, and additionally to a rolling file when `LOG_FILE_PATH`
/// is set.
fn init_logger() -> Result<(), StartupError> {
    let stderr_level = LevelFilter::Info;
    let file_level = LevelFilter::Debug;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d} {l} {t} - {m}{n}")))
        .build();

    let mut config = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(stderr_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Ok(file_path) = std::env::var("LOG_FILE_PATH") {
        let archive_pattern = std::env::var("LOG_ARCHIVE_PATTERN")
            .unwrap_or_else(|_| format!("{}.{{}}.gz", file_path));

        let trigger = SizeTrigger::new(LOG_SIZE_LIMIT);
        let roller = FixedWindowRoller::builder().build(&archive_pattern, LOG_FILE_COUNT)?;
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

        let logfile = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} {l} {t} - {m}{n}")))
            .build(file_path, Box::new(policy))?;

        config = config.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(file_level)))
                .build("logfile", Box::new(logfile)),
        );
        root = root.appender("logfile");
    }

    let config = config.build(root.build(LevelFilter::Debug))?;
    log4rs::init_config(config)?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received. Preparing graceful exit...");
}

async fn build_state() -> Result<AppState, StartupError> {
    let config = ApiConfig::from_env()?;

    let identity_provider = GoogleIdentityProvider::new(GoogleOAuthConfig {
        client_id: required_env("GOOGLE_CLIENT_ID")?,
        client_secret: required_env("GOOGLE_CLIENT_SECRET")?,
        redirect_url: config.google_callback_url(),
    })?;

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let pool = create_db_pool(&database_url)?;
    init_schema(&pool).await?;

    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let match_repo = Arc::new(SqliteMatchRepository::new(pool));
    let session_tokens = Arc::new(JwtSessionTokens::new(config.jwt_secret.as_bytes()));
    let ws_service = Arc::new(WsService::new());

    let app = build_application(
        user_repo,
        match_repo,
        ws_service.clone(),
        session_tokens,
        Arc::new(identity_provider),
    );

    Ok(AppState {
        app: Arc::new(app),
        ws: ws_service,
        config: Arc::new(config),
    })
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logger() {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    let state = match build_state().await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting application");

    if let Err(e) = http::run(state, shutdown_signal()).await {
        error!("HTTP server failed: {}", e);
        std::process::exit(1);
    }
}
