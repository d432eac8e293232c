use certalert::AppResources;
use certalert::alerts::AlertEngine;
use certalert::config::load_config_or_panic;
use certalert::notify::{Dispatcher, EmailSender, TelegramSender, WebhookSender};
use certalert::scheduler::run_periodic_sweeps;
use certalert::storage::SeaOrmStorage;
use lettre::{AsyncSmtpTransport, Tokio1Executor, transport::smtp::authentication::Credentials};
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use teloxide::Bot;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "certalert=info,sea_orm=info";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    initialize_tracing();
    dotenvy::dotenv().ok();

    let config = Arc::new(load_config_or_panic());

    let ring_provider = crypto::ring::default_provider();
    CryptoProvider::install_default(ring_provider).expect("Failed to install crypto provider");

    // Set up SeaORM database connection
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    // Set up lettre SMTP client
    let creds = Credentials::new(config.smtp.username.clone(), config.smtp.password.clone());
    let mailer = Arc::new(
        AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp.server)
            .expect("Failed to build SMTP transport")
            .port(config.smtp.port)
            .credentials(creds)
            .build(),
    );

    let bot = Bot::new(config.telegram_bot_token.clone());

    let resources = AppResources {
        db,
        mailer,
        bot,
        config: config.clone(),
    };

    let storage = Arc::new(SeaOrmStorage::new(resources.db.clone()));
    let dispatcher = Dispatcher::new(vec![
        Box::new(EmailSender::new(
            resources.mailer.clone(),
            config.smtp.from.clone(),
        )),
        Box::new(TelegramSender::new(resources.bot.clone())),
        Box::new(WebhookSender::new()),
    ]);
    let engine = Arc::new(AlertEngine::new(
        storage.clone(),
        dispatcher,
        config.base_url.clone(),
    ));

    let sweeps = tokio::spawn(run_periodic_sweeps(storage, engine, config.poll.clone()));

    tokio::select! {
        _ = sweeps => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping periodic sweeps");
        }
    }

    Ok(())
}
