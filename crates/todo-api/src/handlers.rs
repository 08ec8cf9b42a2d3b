use crate::error::{ApiError, ErrorBody};
use crate::AppState;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use domain::{DomainError, NewTodo, Title, Todo, TodoChanges, TodoId};
use serde::{Deserialize, Serialize};

/// `/todo/:id` の id を検証済みの `TodoId` として取り出す
///
/// パーセントデコードに失敗した場合も含め、不正な id は 400 の JSON で返す。
#[derive(Debug)]
pub struct TodoIdPath(pub TodoId);

#[async_trait]
impl<S> FromRequestParts<S> for TodoIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| DomainError::InvalidTodoId(e.body_text()))?;
        Ok(Self(TodoId::parse(&raw)?))
    }
}

/// POST /todo リクエスト（title 以外のキーは無視）
/// null と欠落はどちらも空として扱う
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// PUT /todo/:id リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// GET /todo レスポンス
#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub data: Vec<Todo>,
}

/// POST /todo レスポンス
#[derive(Debug, Serialize)]
pub struct CreateTodoResponse {
    pub message: &'static str,
    pub todo_id: TodoId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// トップページ（static/home.tpl）
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let page = state
        .renderer
        .render_home()
        .await
        .map_err(|e| state.render_error(e))?;
    Ok(Html(page))
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<TodoListResponse>, ApiError> {
    let todos = state
        .repo
        .list_all()
        .await
        .map_err(|e| state.storage_error("Failed to fetch todo", e))?;

    Ok(Json(TodoListResponse { data: todos }))
}

/// ボディは Content-Type に関係なく JSON として読む
pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateTodoRequest = serde_json::from_slice(&body)?;
    let title = Title::parse(request.title.unwrap_or_default())?;

    let todo_id = state
        .repo
        .insert(NewTodo::new(title))
        .await
        .map_err(|e| state.storage_error("Failed to save todo", e))?;

    tracing::info!(todo_id = %todo_id, "todo created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTodoResponse {
            message: "Todo created successfully",
            todo_id,
        }),
    ))
}

/// 検証順: id の形式 → ボディ → title
pub async fn update_todo(
    State(state): State<AppState>,
    TodoIdPath(id): TodoIdPath,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let request: UpdateTodoRequest = serde_json::from_slice(&body)?;
    let changes = TodoChanges {
        title: Title::parse(request.title.unwrap_or_default())?,
        completed: request.completed.unwrap_or_default(),
    };

    state
        .repo
        .update_by_id(&id, changes)
        .await
        .map_err(|e| state.storage_error("Failed to update todo", e))?;

    Ok(Json(MessageResponse {
        message: "Todo updated successfully",
    }))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    TodoIdPath(id): TodoIdPath,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .repo
        .delete_by_id(&id)
        .await
        .map_err(|e| state.storage_error("Failed to delete todo", e))?;
    if !removed {
        return Err(ApiError::NotFound);
    }

    tracing::info!(todo_id = %id, "todo deleted");

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully",
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::message("Not found")))
}
