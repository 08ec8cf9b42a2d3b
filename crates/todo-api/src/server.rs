//! HTTP サーバのライフサイクル
//!
//! 接続ごとに tokio タスクで処理し、シャットダウン要求を受けたら
//! 新規接続の受け付けを止めて、猶予時間内だけ処理中のリクエストを待つ。

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use shared::Config;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// サーバのタイムアウト設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// リクエストボディの読み込み期限
    pub read_timeout: Duration,
    /// リクエスト処理全体（レスポンス生成まで）の期限
    pub write_timeout: Duration,
    /// keep-alive 接続が次のリクエストヘッダを送り終えるまでの期限
    pub idle_timeout: Duration,
    /// シャットダウン時に処理中リクエストを待つ時間
    pub shutdown_grace: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            idle_timeout: config.idle_timeout,
            shutdown_grace: config.shutdown_grace,
        }
    }
}

/// `shutdown` が完了するまで接続を受け付ける
///
/// 完了後はリスナーを閉じ、各接続に現在のリクエストで終了するよう伝える。
/// `shutdown_grace` を過ぎても終わらない接続は待たずに戻る。
pub async fn serve<F>(listener: TcpListener, router: Router, settings: ServerSettings, shutdown: F)
where
    F: Future<Output = ()> + Send,
{
    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(settings.idle_timeout);

    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("shutting down server");
                break;
            }
        };

        let service = TowerToHyperService::new(router.clone());
        let conn = graceful.watch(builder.serve_connection(TokioIo::new(stream), service));

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(peer = %peer, error = %e, "connection closed with error");
            }
        });
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("server gracefully stopped");
        }
        _ = tokio::time::sleep(settings.shutdown_grace) => {
            warn!(
                grace_ms = settings.shutdown_grace.as_millis() as u64,
                "grace period elapsed, abandoning in-flight requests"
            );
        }
    }
}

/// Ctrl-C（SIGINT）または SIGTERM を待つ
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for interrupt signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for terminate signal");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received interrupt signal"),
        _ = terminate => info!("received terminate signal"),
    }
}
