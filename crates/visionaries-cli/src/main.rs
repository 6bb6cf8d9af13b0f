//! Visionaries School CLI - terminal front end for the session core.
//!
//! Logs in against the mock or real API, keeps the session in the
//! configured store, and can run the token refresh loop in the foreground.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use visionaries_core::{
    backend_from_config, store_from_config, Config, RefreshScheduler, Session, SessionManager,
};

// ============================================================================
// Constants
// ============================================================================

/// Log file name prefix when `log_dir` is configured
const LOG_FILE_PREFIX: &str = "visionaries.log";

const USAGE: &str = "\
Usage: visionaries <command>

Commands:
  login [email]   Log in (prompts for anything not given)
  logout          Clear the stored session
  status          Show the current session
  route           Show the landing route and screens for the current user
  can <screen>    Check whether the current user may open a screen
  watch           Keep the session fresh until Ctrl-C, printing every change
";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });
    config.apply_env_overrides();

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!(mock = config.use_mock_data, store = ?config.store, "Visionaries CLI starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprint!("{}", USAGE);
        return Ok(());
    };

    let backend = backend_from_config(&config).context("Failed to create auth backend")?;
    let store = store_from_config(&config)?;
    let manager = Arc::new(SessionManager::new(backend, store));
    let outcome = manager.resume().await;
    debug!(?outcome, "Session resumed");

    match command.as_str() {
        "login" => login(&manager, &mut config, args.get(1).cloned()).await,
        "logout" => {
            manager.logout().await;
            println!("Logged out.");
            Ok(())
        }
        "status" => {
            print_session(&manager.session());
            Ok(())
        }
        "route" => route(&manager),
        "can" => {
            let screen = args
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("Usage: visionaries can <screen>"))?;
            let allowed = manager.can_access(screen);
            println!("{}", if allowed { "allowed" } else { "denied" });
            Ok(())
        }
        "watch" => watch(manager, Duration::from_secs(config.refresh_interval_secs)).await,
        "-h" | "--help" | "help" => {
            print!("{}", USAGE);
            Ok(())
        }
        other => {
            eprint!("Unknown command: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    }
}

async fn login(manager: &SessionManager, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");

    match manager.login(&email, &password).await {
        Ok(session) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                tracing::warn!(error = %e, "Failed to save config");
            }
            println!("Login successful!\n");
            print_session(&session);
            if let Some(target) = manager.navigation_target() {
                println!("Route:   {}", target);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Login failed: {}", e)),
    }
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), last_email) {
        (true, Some(last)) => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

fn route(manager: &SessionManager) -> Result<()> {
    let role = manager
        .current_role()
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `visionaries login` first."))?;
    println!("Role:    {}", role.display_name());
    println!("Route:   {}", role.navigation_target());
    println!("Screens: {}", role.permitted_screens().join(", "));
    Ok(())
}

async fn watch(manager: Arc<SessionManager>, interval: Duration) -> Result<()> {
    let mut rx = manager.subscribe();
    print_session(&rx.borrow_and_update().clone());

    let _scheduler = RefreshScheduler::spawn(manager.clone(), interval);
    println!("\nWatching session (Ctrl-C to stop)...");

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = rx.borrow_and_update().clone();
                println!("\n[{}] session {}", chrono::Local::now().format("%H:%M:%S"), session.state().label());
                print_session(&session);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    info!("Watch stopped");
    Ok(())
}

fn print_session(session: &Session) {
    println!("State:   {}", session.state().label());
    if let Some(ref user) = session.user {
        println!("User:    {} <{}>", user.full_name(), user.email);
        println!("Role:    {}", user.role.display_name());
    }
    if let Some(ref tokens) = session.tokens {
        if tokens.is_expired() {
            println!("Token:   expired");
        } else {
            println!("Token:   expires in {} min", tokens.minutes_until_expiry());
        }
    }
}
