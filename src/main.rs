use clap::Parser;
use color_eyre::Result;
use std::sync::Arc;
use tdl::api::HttpBackend;
use tdl::cli::{self, Cli, Commands};
use tdl::dispatch::Dispatcher;
use tdl::session::{FileTokenStore, Session};
use tdl::{Config, Profile, logging};
use tracing::info;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let profile = Profile::from_dev_flag(cli.dev);

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    // Held until exit so buffered log lines are flushed
    let _log_guard = logging::init(&logging::log_dir(profile)?, &config.log_level)?;
    info!(api_url = %config.api_url, ?profile, "starting");

    let runtime = tokio::runtime::Runtime::new()?;
    let backend = HttpBackend::new(&config.api_url, config.request_timeout())?;
    let mut session = Session::open(Box::new(FileTokenStore::for_profile(profile)?))?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let dispatcher = Dispatcher::new(runtime.handle().clone(), Arc::new(backend));
            let app = tdl::tui::App::new(config, session, dispatcher);
            tdl::tui::run_event_loop(app)?;
        }
        Commands::Register { name, email, password } => {
            runtime.block_on(cli::handle_register(&backend, name, email, password))?;
        }
        Commands::Login { email, password } => {
            runtime.block_on(cli::handle_login(&backend, &mut session, email, password))?;
        }
        Commands::Logout => cli::handle_logout(&mut session)?,
        Commands::List {
            search,
            completed,
            order_by,
            order_direction,
            page,
            page_size,
        } => {
            let query = cli::list_query(
                search,
                completed,
                order_by,
                order_direction,
                page,
                page_size.unwrap_or(config.page_size),
            );
            runtime.block_on(cli::handle_list(&backend, &session, query))?;
        }
        Commands::Add {
            description,
            priority,
            date,
        } => {
            runtime.block_on(cli::handle_add(&backend, &session, description, priority, date))?;
        }
        Commands::Edit {
            id,
            description,
            priority,
            date,
        } => {
            runtime.block_on(cli::handle_edit(&backend, &session, id, description, priority, date))?;
        }
        Commands::Toggle { id } => runtime.block_on(cli::handle_toggle(&backend, &session, id))?,
        Commands::Delete { id } => runtime.block_on(cli::handle_delete(&backend, &session, id))?,
    }

    Ok(())
}
