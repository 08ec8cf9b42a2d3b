use thiserror::Error;

/// 入力値の検証エラー
///
/// 表示文字列はそのままクライアントへ返すメッセージになる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("The id is invalid")]
    InvalidTodoId(String),

    #[error("The title field is required")]
    TitleRequired,
}

pub type DomainResult<T> = Result<T, DomainError>;
