//! エラー型定義
//!
//! 共通クレートはI/Oを持たないので、失敗はモデル応答の解釈だけ。

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// 応答にJSONらしき部分が無い
    #[error("JSONが見つかりません")]
    MissingJson,

    /// JSONとして読めない、または期待する形でない
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
