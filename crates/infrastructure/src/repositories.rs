use domain::{NewTodo, Todo, TodoChanges, TodoId};
use futures::future::BoxFuture;
use thiserror::Error;

/// ストレージ層のエラー
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("invalid object id: {0}")]
    InvalidId(String),

    #[error("{0}")]
    Driver(String),

    #[error("failed to decode stored document: {0}")]
    Decode(String),

    #[error("document store is unavailable")]
    Unavailable,
}

impl From<mongodb::error::Error> for StorageError {
    fn from(e: mongodb::error::Error) -> Self {
        StorageError::Driver(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Todo コレクションへのゲートウェイ
///
/// プロセス起動時に 1 度だけ作られ、全ハンドラから共有される。
pub trait TodoRepository: Send + Sync {
    /// 新しい Todo を保存し、ストアが採番した ID を返す
    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, StorageResult<TodoId>>;

    /// コレクション全体を返す（順序は不定）
    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Todo>>>;

    /// title と completed だけを置き換える
    /// 該当するドキュメントが無くても成功として扱う。
    fn update_by_id<'a>(
        &'a self,
        id: &'a TodoId,
        changes: TodoChanges,
    ) -> BoxFuture<'a, StorageResult<()>>;

    /// ドキュメントを削除し、実際に削除できたかを返す
    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, StorageResult<bool>>;
}
