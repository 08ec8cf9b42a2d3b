//! Todo サービスの HTTP API（axum）
//!
//! ルーティングとアプリケーション状態を定義します。
//! ハンドラは `handlers`、サーバのライフサイクルは `server` を参照。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod server;

use axum::{
    middleware::{from_fn, map_response},
    routing::{get, put},
    Router,
};
use infrastructure::{StorageError, TodoRepository};
use std::sync::Arc;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

pub use error::ApiError;
pub use render::{PageRenderer, RenderError};
pub use server::ServerSettings;

/// アプリケーションの共有状態
/// エントリポイントで 1 度だけ組み立て、各ハンドラへ注入する。
#[derive(Clone)]
pub struct AppState {
    repo: Arc<dyn TodoRepository>,
    renderer: Arc<PageRenderer>,
    expose_error_details: bool,
}

impl AppState {
    pub fn new(repo: Arc<dyn TodoRepository>, renderer: PageRenderer) -> Self {
        Self {
            repo,
            renderer: Arc::new(renderer),
            expose_error_details: false,
        }
    }

    /// 500 系レスポンスにドライバ/テンプレートのエラー文言を含めるか
    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    pub(crate) fn storage_error(&self, message: &'static str, source: StorageError) -> ApiError {
        ApiError::Storage {
            message,
            source,
            expose_details: self.expose_error_details,
        }
    }

    pub(crate) fn render_error(&self, source: RenderError) -> ApiError {
        ApiError::Render {
            source,
            expose_details: self.expose_error_details,
        }
    }
}

/// ルータを構築して返します（タイムアウトなし。テスト用）
pub fn app(state: AppState) -> Router {
    routes(state)
        .layer(map_response(middleware::json_error_bodies))
        .layer(from_fn(middleware::log_requests))
}

/// 本番用のルータ。読み込み/書き込みタイムアウトを適用する
/// タイムアウト応答（408）も JSON にしてからログへ出すため、この 2 つを外側に置く。
pub fn router(state: AppState, settings: &ServerSettings) -> Router {
    routes(state)
        .layer(TimeoutLayer::new(settings.write_timeout))
        .layer(RequestBodyTimeoutLayer::new(settings.read_timeout))
        .layer(map_response(middleware::json_error_bodies))
        .layer(from_fn(middleware::log_requests))
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/todo",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todo/",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todo/:id",
            put(handlers::update_todo).delete(handlers::delete_todo),
        )
        .fallback(handlers::not_found)
        .with_state(state)
}
