//! Linkshelf CLI application entry point
//!
//! # Usage
//!
//! ```bash
//! # Load a catalog into the local database
//! linkshelf import catalog.json
//!
//! # Browse (default command), filter and sort
//! linkshelf
//! linkshelf list postgres -t database --sort popular
//! linkshelf list -c hosting --featured -f json
//!
//! # Act on an entry
//! linkshelf open supabase
//! linkshelf save supabase
//! linkshelf share supabase
//!
//! # Quick-jump palette
//! linkshelf palette -i
//!
//! # Quiet mode (only output results)
//! linkshelf -q saved
//! ```
//!
//! # Configuration
//!
//! Configuration is stored in the user's config directory
//! (`~/.config/linkshelf/config.toml` on Linux) and written with defaults on
//! first run.

use std::io;
use std::sync::Arc;

use env_logger::Env;
use linkshelf::{
    ShelfError,
    backend::{Backend, LocalBackend},
    browse::BrowseSession,
    cache::QueryCache,
    cli::{Cli, Commands},
    commands,
    config::{BackendKind, ShelfConfig},
    db::Database,
    keybinds::KeyRouter,
    models::User,
    store::AppStore,
};

type Result<T> = std::result::Result<T, ShelfError>;

fn init_logging(config: &ShelfConfig) {
    let default_level = config.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[cfg(feature = "remote")]
fn remote_backend(config: &ShelfConfig) -> Result<Arc<dyn Backend>> {
    Ok(Arc::new(linkshelf::backend::RestBackend::new(&config.remote)?))
}

#[cfg(not(feature = "remote"))]
fn remote_backend(_config: &ShelfConfig) -> Result<Arc<dyn Backend>> {
    Err(ShelfError::InvalidInput(
        "This build has no remote backend support; set backend = \"local\"".into(),
    ))
}

/// Restore the store from the database, starting fresh if the snapshot is unreadable
fn load_store(db: &Database, config: &ShelfConfig) -> AppStore {
    let persisted = match db.load_state() {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            log::warn!("ignoring unreadable saved state: {e}");
            Default::default()
        }
    };

    let mut store = AppStore::from_persisted(persisted);
    if let Some(user_id) = &config.user_id {
        store.set_user(Some(User::new(user_id.clone(), String::new())));
    }
    store
}

/// Build a browsing session over the configured backend
fn open_session(config: &ShelfConfig, db: &Arc<Database>) -> Result<BrowseSession> {
    let backend: Arc<dyn Backend> = match config.backend {
        BackendKind::Local => Arc::new(LocalBackend::new(Arc::clone(db))),
        BackendKind::Remote => remote_backend(config)?,
    };

    Ok(BrowseSession::new(backend, load_store(db, config))
        .with_cache(QueryCache::from_config(&config.cache))
        .with_search_options(config.search)
        .persist_to(Arc::clone(db)))
}

/// Wait for background click tracking, then hand back the command result
async fn finish(mut session: BrowseSession, result: Result<()>) -> Result<()> {
    session.settle().await;
    result
}

/// Main entry point for the linkshelf application
///
/// Loads configuration, parses command-line arguments, and dispatches to the
/// appropriate command handler.
///
/// # Errors
///
/// Returns `ShelfError` if configuration loading fails, database
/// initialization fails, or any command handler returns an error.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = ShelfConfig::load()?;
    init_logging(&config);

    let quiet = cli.quiet || config.quiet;
    let command = cli.get_command();
    let mut out = io::stdout().lock();

    let db = Arc::new(Database::open(config.database_path()?)?);

    let result = match &command {
        Commands::Completions { shell } => {
            commands::completions(*shell, &mut out);
            Ok(())
        }
        Commands::Import { path } => {
            if config.backend == BackendKind::Remote && !quiet {
                eprintln!("Note: importing into the local database; the remote backend is unchanged.");
            }
            commands::import(&LocalBackend::new(Arc::clone(&db)), path, quiet, &mut out)
        }
        Commands::List { args } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::list(&mut session, args, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Open { id } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::open(&mut session, id, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Save { id } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::save(&mut session, id, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Saved { format } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::saved(&mut session, *format, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Recent { format } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::recent(&mut session, *format, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Share { id } => {
            let session = open_session(&config, &db)?;
            let result = commands::share(&session, id, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Categories { format } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::categories(&mut session, *format, quiet, &mut out).await;
            finish(session, result).await
        }
        Commands::Palette {
            query,
            interactive,
            pick,
        } => {
            let router = KeyRouter::from_config(&config.keybinds);
            let mut session = open_session(&config, &db)?;
            let result = commands::palette(
                &mut session,
                query.as_deref(),
                *pick,
                *interactive,
                &router,
                quiet,
                &mut out,
            )
            .await;
            finish(session, result).await
        }
        Commands::View { .. } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::view(&mut session, command.get_view_patch(), quiet, &mut out);
            finish(session, result).await
        }
        Commands::Theme { .. } => {
            let mut session = open_session(&config, &db)?;
            let result = commands::theme(&mut session, command.get_dark_mode(), quiet, &mut out);
            finish(session, result).await
        }
    };

    db.flush()?;
    result
}
