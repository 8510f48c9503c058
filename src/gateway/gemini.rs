//! Gemini API連携
//!
//! レポート/画像解析は構造化出力（responseSchema）、統合と質疑応答はテキスト出力。

use super::AnalysisGateway;
use crate::config::Config;
use crate::error::{CancerXError, Result};
use crate::session::CaseFile;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cancerx_common::{
    build_chat_prompt, build_synthesis_prompt, document_response_schema, image_response_schema,
    parse_document_analysis, parse_image_analysis, AnalysisContext, ChatMessage, DocumentAnalysis,
    ImageAnalysis, DOCUMENT_ANALYSIS_PROMPT, IMAGE_ANALYSIS_PROMPT, NO_SYNTHESIS_DATA_MESSAGE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// 構造化抽出の温度
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

impl GenerationConfig {
    fn text(temperature: f32) -> Self {
        Self {
            temperature,
            response_mime_type: None,
            response_schema: None,
        }
    }

    fn json(temperature: f32, schema: serde_json::Value) -> Self {
        Self {
            temperature,
            response_mime_type: Some("application/json".into()),
            response_schema: Some(schema),
        }
    }
}

/// Gemini APIレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// 先頭候補のテキストパートを連結
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(CancerXError::ApiCall(format!("プロンプトがブロックされました: {}", reason)));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CancerXError::ApiCall("空のレスポンス".into()));
        }
        Ok(text)
    }
}

pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    synthesis_temperature: f32,
    chat_temperature: f32,
    directive: Option<String>,
}

impl GeminiGateway {
    pub fn new(config: &Config, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/{}:generateContent",
                config.api_base_url.trim_end_matches('/'),
                config.model
            ),
            synthesis_temperature: config.synthesis_temperature,
            chat_temperature: config.chat_temperature,
            directive: None,
        })
    }

    /// 設定ファイル/環境変数のAPIキーで作成
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, config.get_api_key()?)
    }

    /// 統合と質疑応答に差し込む解析者の指示
    pub fn with_directive(mut self, directive: Option<String>) -> Self {
        self.directive = directive.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        debug!(endpoint = %self.endpoint, "Gemini API呼び出し");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CancerXError::ApiCall(format!("{}: {}", status, body.trim())));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CancerXError::ApiParse(e.to_string()))?;
        let text = payload.into_text()?;
        debug!(chars = text.len(), "Gemini API応答");
        Ok(text)
    }
}

fn file_request(prompt: &str, file: &CaseFile, schema: serde_json::Value) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt.to_string() },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: file.media_type.clone(),
                        data: STANDARD.encode(&file.bytes),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig::json(ANALYSIS_TEMPERATURE, schema),
    }
}

fn text_request(prompt: String, temperature: f32) -> GeminiRequest {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![Part::Text { text: prompt }],
        }],
        generation_config: GenerationConfig::text(temperature),
    }
}

#[async_trait]
impl AnalysisGateway for GeminiGateway {
    async fn analyze_document(&self, file: &CaseFile) -> Result<DocumentAnalysis> {
        info!(file = %file.name, bytes = file.size(), "レポート解析リクエスト");
        let request = file_request(DOCUMENT_ANALYSIS_PROMPT, file, document_response_schema());
        let text = self.generate(&request).await?;
        parse_document_analysis(&text).map_err(|e| CancerXError::ApiParse(e.to_string()))
    }

    async fn analyze_image(&self, file: &CaseFile) -> Result<ImageAnalysis> {
        info!(file = %file.name, bytes = file.size(), "画像解析リクエスト");
        let request = file_request(IMAGE_ANALYSIS_PROMPT, file, image_response_schema());
        let text = self.generate(&request).await?;
        parse_image_analysis(&text).map_err(|e| CancerXError::ApiParse(e.to_string()))
    }

    async fn synthesize(&self, documents: &[DocumentAnalysis], images: &[ImageAnalysis]) -> Result<String> {
        if documents.is_empty() && images.is_empty() {
            return Ok(NO_SYNTHESIS_DATA_MESSAGE.to_string());
        }

        info!(documents = documents.len(), images = images.len(), "統合レポートリクエスト");
        let prompt = build_synthesis_prompt(documents, images, self.directive.as_deref());
        self.generate(&text_request(prompt, self.synthesis_temperature)).await
    }

    async fn answer_question(
        &self,
        context: &AnalysisContext,
        transcript: &[ChatMessage],
        question: &str,
    ) -> Result<String> {
        info!(turns = transcript.len(), "質疑応答リクエスト");
        let prompt = build_chat_prompt(context, transcript, question, self.directive.as_deref());
        self.generate(&text_request(prompt, self.chat_temperature)).await
    }
}
