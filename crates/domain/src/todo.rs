use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ドキュメントストア（MongoDB）の ObjectId を 16 進表記した Todo の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// ObjectId の 16 進表記の長さ
    pub const LEN: usize = 24;

    /// URL パラメータなどの生文字列から TodoId を作成
    /// 前後の空白は取り除き、16 進数字は小文字に正規化する。
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::LEN || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidTodoId(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 空でないことが保証されたタイトル
///
/// 空白のみのタイトルはそのまま受け付ける（トリムはしない）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    pub fn parse(value: String) -> DomainResult<Self> {
        if value.is_empty() {
            return Err(DomainError::TitleRequired);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// クライアントへ返す Todo の表現
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// 挿入前の Todo（ID はストアが採番する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: Title,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTodo {
    /// 未完了の Todo を現在時刻で作成
    /// ストアの日時はミリ秒精度のため、書き込む値と読み戻す値が一致するよう切り詰める。
    pub fn new(title: Title) -> Self {
        Self {
            title,
            completed: false,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn into_todo(self, id: TodoId) -> Todo {
        Todo {
            id,
            title: self.title.into_inner(),
            completed: self.completed,
            created_at: self.created_at,
        }
    }
}

/// 更新で置き換えるフィールド（id と created_at は変更しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Title,
    pub completed: bool,
}

impl Todo {
    pub fn apply(&mut self, changes: TodoChanges) {
        self.title = changes.title.into_inner();
        self.completed = changes.completed;
    }
}
