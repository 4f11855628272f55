mod auth;
mod calendar;
mod config;
mod diary_entry;
mod diary_state;
mod item_board;
mod session;
mod storage;
mod ui;

use auth::AuthClient;
use color_eyre::Result;
use config::AppConfig;
use diary_state::DiaryState;
use item_board::ItemBoard;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use storage::KvStore;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use ui::{AppOutcome, AuthOutcome, UI};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = AppConfig::load()?;
    let data_dir = config.data_dir();
    let store = KvStore::open(&data_dir).await?;
    let _log_guard = init_tracing(&data_dir)?;

    // hydrate once before the first render; a missing or broken document
    // just starts an empty diary
    let mut diary = DiaryState::load(store).await;
    let mut board = ItemBoard::new();

    let auth = AuthClient::new(config.auth_endpoint.clone(), config.api_key.clone());
    let watch = auth.watch();

    // the router follows the session: signed out shows the sign-in form,
    // signed in shows the tabs
    let signed_in = Arc::new(AtomicBool::new(watch.current().is_some()));
    let _route_sub = watch.subscribe({
        let signed_in = Arc::clone(&signed_in);
        move |session| signed_in.store(session.is_some(), Ordering::SeqCst)
    });

    let mut ui = UI::new()?;
    loop {
        if signed_in.load(Ordering::SeqCst) {
            match ui.main_screen(&mut diary, &mut board)? {
                AppOutcome::SignOut => auth.sign_out()?,
                AppOutcome::Quit => break,
            }
        } else {
            match ui.auth_screen(&auth).await? {
                AuthOutcome::SignedIn(_) => {}
                AuthOutcome::Quit => break,
            }
        }
    }

    Ok(())
}

/// The TUI owns the terminal, so diagnostics go to a file in the data
/// directory. `DAYBOOK_LOG` filters like `RUST_LOG`.
fn init_tracing(data_dir: &Path) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::never(data_dir, "daybook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("DAYBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
