use std::sync::Arc;

use planhold::auth::{InMemorySessionStore, Sessions};
use planhold::notify::{ConsoleMailer, MailNotifier, Mailer, SmtpMailer};
use planhold::store::SeaOrmStore;
use planhold::{AppState, ConfigBuilder, build_router, init_tracing_with_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().from_env().build();
    init_tracing_with_config(&config);

    let store = SeaOrmStore::connect(&config.database.url).await?;
    store.migrate().await?;

    // SMTP when configured, console output otherwise.
    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_env() {
        Ok(smtp) => Arc::new(smtp),
        Err(e) => {
            tracing::warn!(error = %e, "SMTP not configured, using console mailer");
            Arc::new(ConsoleMailer::new())
        }
    };
    let from = std::env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@planhold.local".to_string());
    let notifier = Arc::new(MailNotifier::new(mailer, from));

    let sessions = Sessions::new(
        Arc::new(InMemorySessionStore::new()),
        config.session.clone(),
    );

    let state = AppState::new(Arc::new(store), notifier, sessions);
    let app = build_router(state);

    let addr = config.server.addr()?;
    tracing::info!(%addr, "planhold listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
