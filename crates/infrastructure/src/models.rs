use crate::repositories::{StorageError, StorageResult};
use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use domain::{NewTodo, Todo, TodoChanges, TodoId};
use serde::{Deserialize, Serialize};

/// `todo` コレクションに保存されるドキュメント
///
/// 作成日時のキーはストア上では `createdAt`（API 上は `created_at`）。
/// 丸ごと置換された古いドキュメントには `createdAt` が無いことがあり、
/// その場合は `_id` に埋め込まれた生成時刻（秒精度）を使う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub completed: bool,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<bson::DateTime>,
}

impl TodoDocument {
    pub fn from_new(id: ObjectId, todo: NewTodo) -> Self {
        Self {
            id,
            title: todo.title.into_inner(),
            completed: todo.completed,
            created_at: Some(bson::DateTime::from_chrono(todo.created_at)),
        }
    }

    pub fn todo_id(&self) -> StorageResult<TodoId> {
        TodoId::parse(&self.id.to_hex()).map_err(|e| StorageError::Decode(e.to_string()))
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
            .unwrap_or_else(|| self.id.timestamp())
            .to_chrono()
    }

    pub fn into_todo(self) -> StorageResult<Todo> {
        Ok(Todo {
            id: self.todo_id()?,
            created_at: self.created_at(),
            title: self.title,
            completed: self.completed,
        })
    }
}

pub fn object_id(id: &TodoId) -> StorageResult<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| StorageError::InvalidId(id.to_string()))
}

pub fn id_filter(id: &TodoId) -> StorageResult<Document> {
    Ok(doc! { "_id": object_id(id)? })
}

/// 部分更新（$set）。`_id` と `createdAt` には触れない
pub fn update_document(changes: &TodoChanges) -> Document {
    doc! {
        "$set": {
            "title": changes.title.as_str(),
            "completed": changes.completed,
        }
    }
}
