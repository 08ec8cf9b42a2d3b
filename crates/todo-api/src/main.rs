//! todo-api バイナリのエントリポイント
//! ドキュメントストアへの接続を確立してから HTTP サーバを起動します。

use anyhow::{anyhow, Context};
use infrastructure::MongoTodoRepository;
use shared::{init_tracing, Config};
use std::sync::Arc;
use todo_api::{router, server, AppState, PageRenderer, ServerSettings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(config.log_format).map_err(|e| anyhow!("failed to initialise tracing: {e}"))?;

    if let Err(e) = run(config).await {
        tracing::error!(error = ?e, "todo-api terminated");
        return Err(e);
    }

    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    // 接続できなければ起動しない
    let repo = MongoTodoRepository::connect(&config)
        .await
        .with_context(|| format!("failed to connect to document store (db {})", config.db_name))?;

    let renderer = PageRenderer::new(&config.template_path);
    tracing::info!(template = %renderer.template_path().display(), "page renderer ready");

    let state =
        AppState::new(Arc::new(repo), renderer).with_error_details(config.expose_error_details);
    let settings = ServerSettings::from(&config);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server starting");

    server::serve(
        listener,
        router(state, &settings),
        settings,
        server::shutdown_signal(),
    )
    .await;

    Ok(())
}
