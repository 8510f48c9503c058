//! 外部解析サービスとの境界
//!
//! セッション側はこのトレイトだけを見る。実装は Gemini と、テスト用の差し替え。

mod gemini;

pub use gemini::GeminiGateway;

use crate::error::Result;
use crate::session::CaseFile;
use async_trait::async_trait;
use cancerx_common::{AnalysisContext, ChatMessage, DocumentAnalysis, ImageAnalysis};

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// 病理レポート1件を構造化抽出
    async fn analyze_document(&self, file: &CaseFile) -> Result<DocumentAnalysis>;

    /// 医用画像1件を解析（関心領域付き）
    async fn analyze_image(&self, file: &CaseFile) -> Result<ImageAnalysis>;

    /// 成功した解析結果すべてから統合レポート（markdown）を生成
    async fn synthesize(&self, documents: &[DocumentAnalysis], images: &[ImageAnalysis]) -> Result<String>;

    /// 文脈と会話履歴を踏まえて質問に回答
    ///
    /// `transcript` には `question` のユーザーターンが既に含まれている
    async fn answer_question(
        &self,
        context: &AnalysisContext,
        transcript: &[ChatMessage],
        question: &str,
    ) -> Result<String>;
}
