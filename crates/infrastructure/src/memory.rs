use crate::models::{object_id, TodoDocument};
use crate::repositories::{StorageError, StorageResult, TodoRepository};
use bson::oid::ObjectId;
use domain::{NewTodo, Todo, TodoChanges, TodoId};
use futures::future::{self, BoxFuture};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 簡易な InMemory 実装（開発/テスト用）
///
/// 保存形式は MongoDB と同じ `TodoDocument` を使う。
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    documents: Mutex<Vec<TodoDocument>>,
    unavailable: AtomicBool,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// true の間は全操作が `StorageError::Unavailable` を返す
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> MutexGuard<'_, Vec<TodoDocument>> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        Ok(())
    }

    fn insert_now(&self, todo: NewTodo) -> StorageResult<TodoId> {
        self.ensure_available()?;
        let document = TodoDocument::from_new(ObjectId::new(), todo);
        let id = document.todo_id()?;
        self.documents().push(document);
        Ok(id)
    }

    fn list_now(&self) -> StorageResult<Vec<Todo>> {
        self.ensure_available()?;
        self.documents()
            .iter()
            .cloned()
            .map(TodoDocument::into_todo)
            .collect()
    }

    fn update_now(&self, id: &TodoId, changes: TodoChanges) -> StorageResult<()> {
        self.ensure_available()?;
        let oid = object_id(id)?;
        if let Some(document) = self.documents().iter_mut().find(|d| d.id == oid) {
            document.title = changes.title.into_inner();
            document.completed = changes.completed;
        }
        Ok(())
    }

    fn delete_now(&self, id: &TodoId) -> StorageResult<bool> {
        self.ensure_available()?;
        let oid = object_id(id)?;
        let mut documents = self.documents();
        let before = documents.len();
        documents.retain(|d| d.id != oid);
        Ok(documents.len() < before)
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, StorageResult<TodoId>> {
        Box::pin(future::ready(self.insert_now(todo)))
    }

    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Todo>>> {
        Box::pin(future::ready(self.list_now()))
    }

    fn update_by_id<'a>(
        &'a self,
        id: &'a TodoId,
        changes: TodoChanges,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(future::ready(self.update_now(id, changes)))
    }

    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, StorageResult<bool>> {
        Box::pin(future::ready(self.delete_now(id)))
    }
}
