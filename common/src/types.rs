//! 解析結果の型定義
//!
//! CLIとセッションコアで共有される型:
//! - DocumentAnalysis: 病理・腫瘍レポートの解析結果
//! - ImageAnalysis: 医用画像の解析結果（関心領域付き）
//! - CaseResult: 上記のタグ付きユニオン
//! - ChatMessage / AnalysisContext: 質疑応答用

use serde::{Deserialize, Serialize};

/// ケース区分（受付時に確定し、以後変わらない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseCategory {
    Document,
    Image,
}

impl CaseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Document => "document",
            CaseCategory::Image => "image",
        }
    }
}

impl std::fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// バイオマーカーと判定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Biomarker {
    pub name: String,
    pub status: String,
}

/// レポート解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentAnalysis {
    /// 元ファイル名（モデル応答には含まれず、成功時に付与）
    pub file_name: String,
    pub is_report_valid: bool,
    pub validity_reasoning: String,
    pub patient_name: String,
    pub cancer_type: String,
    pub tumor_grade: String,
    pub stage: String,
    pub biomarkers: Vec<Biomarker>,
    pub key_findings: Vec<String>,
}

/// 関心領域（座標は画像サイズで正規化された 0.0-1.0）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionOfInterest {
    pub label: String,
    /// 有意・悪性である確信度 (0.0-1.0)
    pub probability: f64,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl RegionOfInterest {
    /// 座標と確信度を [0, 1] に収め、min/max の順序を揃える
    pub fn normalized(&self) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let (x0, x1) = (clamp(self.x_min), clamp(self.x_max));
        let (y0, y1) = (clamp(self.y_min), clamp(self.y_max));
        Self {
            label: self.label.clone(),
            probability: clamp(self.probability),
            x_min: x0.min(x1),
            y_min: y0.min(y1),
            x_max: x0.max(x1),
            y_max: y0.max(y1),
        }
    }
}

/// 画像解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAnalysis {
    /// 元ファイル名（モデル応答には含まれず、成功時に付与）
    pub file_name: String,
    pub is_scan_valid: bool,
    pub validity_reasoning: String,
    pub image_description: String,
    pub findings_summary: String,
    pub regions_of_interest: Vec<RegionOfInterest>,
}

/// 成功したケースの解析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CaseResult {
    Document(DocumentAnalysis),
    Image(ImageAnalysis),
}

impl CaseResult {
    pub fn category(&self) -> CaseCategory {
        match self {
            CaseResult::Document(_) => CaseCategory::Document,
            CaseResult::Image(_) => CaseCategory::Image,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            CaseResult::Document(doc) => &doc.file_name,
            CaseResult::Image(img) => &img.file_name,
        }
    }
}

/// チャットの話者
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// チャットの1ターン
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Model, content: content.into() }
    }
}

/// 質問ごとに送るグラウンディング用コンテキスト
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisContext {
    pub document_analyses: Vec<DocumentAnalysis>,
    pub image_analyses: Vec<ImageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis_report: Option<String>,
}

impl AnalysisContext {
    pub fn is_empty(&self) -> bool {
        self.document_analyses.is_empty()
            && self.image_analyses.is_empty()
            && self.synthesis_report.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_analysis_deserialize_partial() {
        let json = r#"{"isReportValid": true, "validityReasoning": "ok", "patientName": "Jane Doe"}"#;
        let doc: DocumentAnalysis = serde_json::from_str(json).unwrap();
        assert!(doc.is_report_valid);
        assert_eq!(doc.patient_name, "Jane Doe");
        assert!(doc.biomarkers.is_empty());
        assert_eq!(doc.file_name, "");
    }

    #[test]
    fn test_region_keeps_snake_case_keys() {
        let json = r#"{"label": "Nodule", "probability": 0.8, "x_min": 0.1, "y_min": 0.2, "x_max": 0.3, "y_max": 0.4}"#;
        let region: RegionOfInterest = serde_json::from_str(json).unwrap();
        assert_eq!(region.x_min, 0.1);
        assert_eq!(region.y_max, 0.4);

        let out = serde_json::to_string(&region).unwrap();
        assert!(out.contains("\"x_min\""));
    }

    #[test]
    fn test_region_normalized_clamps_and_orders() {
        let region = RegionOfInterest {
            label: "Mass".into(),
            probability: 1.4,
            x_min: 0.9,
            y_min: -0.2,
            x_max: 0.2,
            y_max: 0.5,
        };
        let n = region.normalized();
        assert_eq!(n.probability, 1.0);
        assert_eq!(n.x_min, 0.2);
        assert_eq!(n.x_max, 0.9);
        assert_eq!(n.y_min, 0.0);
        assert_eq!(n.y_max, 0.5);
    }

    #[test]
    fn test_case_result_tagging() {
        let result = CaseResult::Image(ImageAnalysis {
            file_name: "ct.png".into(),
            ..Default::default()
        });
        assert_eq!(result.category(), CaseCategory::Image);
        assert_eq!(result.file_name(), "ct.png");

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"kind\":\"image\""));
    }

    #[test]
    fn test_chat_role_serialize() {
        let msg = ChatMessage::model("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"model","content":"hi"}"#);
    }

    #[test]
    fn test_analysis_context_empty() {
        let mut ctx = AnalysisContext::default();
        assert!(ctx.is_empty());
        ctx.synthesis_report = Some("report".into());
        assert!(!ctx.is_empty());
    }
}
