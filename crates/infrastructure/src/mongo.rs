use crate::models::{id_filter, update_document, TodoDocument};
use crate::repositories::{StorageResult, TodoRepository};
use bson::doc;
use bson::oid::ObjectId;
use domain::{NewTodo, Todo, TodoChanges, TodoId};
use futures::future::BoxFuture;
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use shared::Config;
use tracing::{debug, info};

const APP_NAME: &str = "todo-api";

/// MongoDB の `todo` コレクションを使うリポジトリ
/// コネクションプールはドライバ側が管理する。
#[derive(Clone)]
pub struct MongoTodoRepository {
    collection: Collection<TodoDocument>,
}

impl MongoTodoRepository {
    /// クライアントを作成し、ping で疎通を確認する
    /// ドライバは遅延接続のため、ここで確認しないと起動時に到達不能を検出できない。
    pub async fn connect(config: &Config) -> StorageResult<Self> {
        let mut options = ClientOptions::parse(&config.db_uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(config.db_connect_timeout);
        options.server_selection_timeout = Some(config.db_connect_timeout);

        let client = Client::with_options(options)?;
        let database = client.database(&config.db_name);
        database.run_command(doc! { "ping": 1 }).await?;

        info!(
            db_name = %config.db_name,
            collection = %config.collection_name,
            "connected to document store"
        );

        Ok(Self::from_collection(
            database.collection(&config.collection_name),
        ))
    }

    pub fn from_collection(collection: Collection<TodoDocument>) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<TodoDocument> {
        &self.collection
    }
}

impl TodoRepository for MongoTodoRepository {
    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, StorageResult<TodoId>> {
        Box::pin(async move {
            let document = TodoDocument::from_new(ObjectId::new(), todo);
            self.collection.insert_one(&document).await?;
            document.todo_id()
        })
    }

    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Todo>>> {
        Box::pin(async move {
            let documents: Vec<TodoDocument> =
                self.collection.find(doc! {}).await?.try_collect().await?;
            documents.into_iter().map(TodoDocument::into_todo).collect()
        })
    }

    fn update_by_id<'a>(
        &'a self,
        id: &'a TodoId,
        changes: TodoChanges,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            let result = self
                .collection
                .update_one(id_filter(id)?, update_document(&changes))
                .await?;
            if result.matched_count == 0 {
                debug!(todo_id = %id, "update matched no document");
            }
            Ok(())
        })
    }

    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, StorageResult<bool>> {
        Box::pin(async move {
            let result = self.collection.delete_one(id_filter(id)?).await?;
            Ok(result.deleted_count > 0)
        })
    }
}
