use thiserror::Error;

#[derive(Error, Debug)]
pub enum CancerXError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`cancerx config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("解析可能なファイルがありません: {0}")]
    NoFilesFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("ログ初期化エラー: {0}")]
    Logging(String),

    #[error("対話入力エラー: {0}")]
    Interactive(String),

    #[error(transparent)]
    Common(#[from] cancerx_common::Error),
}

impl From<reqwest::Error> for CancerXError {
    fn from(e: reqwest::Error) -> Self {
        CancerXError::ApiCall(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CancerXError>;
