//! プロンプト生成モジュール
//!
//! ゲートウェイ実装から使われる指示文と構造化出力スキーマ:
//! - DOCUMENT_ANALYSIS_PROMPT / document_response_schema: レポート解析
//! - IMAGE_ANALYSIS_PROMPT / image_response_schema: 画像解析
//! - build_synthesis_prompt: 複数ファイルの統合レポート
//! - build_chat_prompt: 解析結果に基づく質疑応答

use crate::types::{AnalysisContext, ChatMessage, ChatRole, DocumentAnalysis, ImageAnalysis};
use serde_json::{json, Value};

/// 統合対象が無い場合に返す固定メッセージ
pub const NO_SYNTHESIS_DATA_MESSAGE: &str = "No valid data available to generate a synthesis report.";

/// 統合レポートの必須セクション（指示文の記載順）
pub const SYNTHESIS_SECTIONS: [&str; 4] = [
    "Source Documents",
    "Integrated Summary",
    "Correlated Findings & Progression",
    "Key Biomarkers & Clinical Context",
];

pub const DOCUMENT_ANALYSIS_PROMPT: &str = "Your task is to act as a world-class medical data extraction system with expertise in oncology. Your accuracy is paramount. \
1. **VALIDATE THE DOCUMENT:** First, carefully examine the provided document file. Perform OCR if necessary. Determine if it is a medical document, specifically an oncology or pathology report. \
2. **RESPOND BASED ON VALIDITY:** If it is NOT a valid report, set `isReportValid` to `false`, provide a reason, and populate all other fields with empty values. \
If it IS a valid report, set `isReportValid` to `true` and accurately extract all required information. \
**Crucially, if the report's conclusion is benign, normal, or shows no evidence of malignancy, ensure this is clearly stated as the primary entry in the `keyFindings` array.**";

pub const IMAGE_ANALYSIS_PROMPT: &str = "You are a world-class AI medical imaging analyst. Your task is to analyze the provided image with the highest degree of accuracy. \
1. **VALIDATE THE IMAGE:** Determine if it is a medically relevant image (e.g., CT scan, MRI, X-ray, anatomical illustration, pathology diagram). \
2. **DESCRIBE & ANALYZE:** If valid, provide a concise technical description and summarize clinical findings. \
**Crucially, if the image shows healthy tissue or a normal scan with no signs of malignancy or significant abnormalities, the `findingsSummary` must clearly state this (e.g., \"The scan appears normal with no evidence of malignancy.\").** \
Do not pathologize normal features. Identify key regions of interest with bounding boxes only if clinically relevant abnormalities are present. \
3. **HANDLE INVALID IMAGES:** If it's not a medically relevant image (e.g., a photo of a car), set `isScanValid` to `false`, explain why, and leave other fields empty.";

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn number_field(description: &str) -> Value {
    json!({ "type": "NUMBER", "description": description })
}

/// レポート解析の構造化出力スキーマ
pub fn document_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isReportValid": { "type": "BOOLEAN", "description": "Set to true if the document is a valid medical or oncology report, otherwise false." },
            "validityReasoning": string_field("If the document is not valid, provide a brief explanation. If it is valid, confirm its validity."),
            "patientName": string_field("The patient's full name. If not available or invalid, return an empty string."),
            "cancerType": string_field("The specific type of cancer identified. If not available or invalid, return an empty string."),
            "tumorGrade": string_field("The grade of the tumor. If not available or invalid, return an empty string."),
            "stage": string_field("The cancer stage, preferably using TNM classification. If not available or invalid, return an empty string."),
            "biomarkers": {
                "type": "ARRAY",
                "description": "List of identified biomarkers and their status. If not available or invalid, return an empty array.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string_field("Name of the biomarker (e.g., ER, PR, HER2)."),
                        "status": string_field("Status of the biomarker (e.g., Positive, Negative, Percentage)."),
                    },
                    "required": ["name", "status"],
                },
            },
            "keyFindings": {
                "type": "ARRAY",
                "description": "A list of the most critical findings from the report. If not available or invalid, return an empty array.",
                "items": { "type": "STRING" },
            },
        },
        "required": [
            "isReportValid", "validityReasoning", "patientName", "cancerType",
            "tumorGrade", "stage", "biomarkers", "keyFindings"
        ],
    })
}

/// 画像解析の構造化出力スキーマ
pub fn image_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isScanValid": { "type": "BOOLEAN", "description": "Set to true if the image appears to be a medically relevant visual (e.g., CT, MRI, anatomical illustration), otherwise false." },
            "validityReasoning": string_field("If the image is not a valid visual, provide a brief explanation. If it is valid, confirm its validity and identify its type (e.g., 'This is a valid CT scan of the chest.')."),
            "imageDescription": string_field("A concise, technical description of the medical image itself. If not available or invalid, return an empty string."),
            "findingsSummary": string_field("A concise summary of the clinical findings or key features shown in the visual. If not available or invalid, return an empty string."),
            "regionsOfInterest": {
                "type": "ARRAY",
                "description": "A list of suspicious or key regions identified. Bounding boxes must be precise. If not applicable (e.g., simple diagram) or not available, return an empty array.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "label": string_field("A label for the identified region (e.g., 'Suspicious Nodule', 'Aortic Arch')."),
                        "probability": number_field("The model's confidence score (0.0 to 1.0) that this region is significant or malignant. For diagrams, this can be 1.0."),
                        "x_min": number_field("Normalized minimum X coordinate (0.0-1.0) of the bounding box."),
                        "y_min": number_field("Normalized minimum Y coordinate (0.0-1.0) of the bounding box."),
                        "x_max": number_field("Normalized maximum X coordinate (0.0-1.0) of the bounding box."),
                        "y_max": number_field("Normalized maximum Y coordinate (0.0-1.0) of the bounding box."),
                    },
                    "required": ["label", "probability", "x_min", "y_min", "x_max", "y_max"],
                },
            },
        },
        "required": ["isScanValid", "validityReasoning", "imageDescription", "findingsSummary", "regionsOfInterest"],
    })
}

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn directive_block(title: &str, directive: Option<&str>) -> String {
    match directive.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("**{}:**\n{}\n", title, d),
        None => String::new(),
    }
}

/// 統合レポート用プロンプト生成
///
/// # Arguments
/// * `documents` - 成功したレポート解析
/// * `images` - 成功した画像解析
/// * `directive` - 解析者からの指示（任意）
pub fn build_synthesis_prompt(
    documents: &[DocumentAnalysis],
    images: &[ImageAnalysis],
    directive: Option<&str>,
) -> String {
    let reports = documents
        .iter()
        .map(|doc| format!("--- Report: {} ---\n{}", doc.file_name, pretty(doc)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let scans = images
        .iter()
        .map(|img| format!("--- Scan: {} ---\n{}", img.file_name, pretty(img)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let directive = directive_block("Analyst Directive", directive);

    format!(
        r#"You are an expert AI assistant for oncologists. Create a unified Patient Synthesis Report by correlating findings from the provided set of pathology reports and medical scans.

{directive}
**Pathology Report Analyses ({doc_count} reports):**
{reports}

**Medical Scan Analyses ({img_count} scans):**
{scans}

**Instructions:**
1.  First, create a section titled **"{sources}"**. In this section, provide a simple bulleted list of the filenames of all reports and scans being analyzed (e.g., `* Report: patient_report_2023.pdf`, `* Scan: ct_scan_chest.jpeg`).
2.  Next, create a high-level **"{summary}"**. Consolidate patient details if they are consistent across reports. If an analyst directive was provided, address it directly in this summary.
3.  Then, in a section called **"{correlation}"**, critically correlate findings across ALL documents. Explicitly state whether scans confirm findings in reports and reference the specific files. If multiple reports exist, note any progression or changes over time. Highlight any discrepancies.
4.  Finally, create a section for **"{biomarkers}"**.
5.  Maintain a professional, clinical tone. Be concise and direct. Use markdown for clear formatting."#,
        doc_count = documents.len(),
        img_count = images.len(),
        sources = SYNTHESIS_SECTIONS[0],
        summary = SYNTHESIS_SECTIONS[1],
        correlation = SYNTHESIS_SECTIONS[2],
        biomarkers = SYNTHESIS_SECTIONS[3],
    )
}

/// 質疑応答用プロンプト生成
///
/// 会話履歴には新しい質問のターンも含まれている前提。
pub fn build_chat_prompt(
    context: &AnalysisContext,
    history: &[ChatMessage],
    question: &str,
    directive: Option<&str>,
) -> String {
    let mut sections = Vec::new();

    if !context.document_analyses.is_empty() {
        let body = context
            .document_analyses
            .iter()
            .map(|doc| format!("File: {}\n{}", doc.file_name, pretty(doc)))
            .collect::<Vec<_>>()
            .join("\n---\n");
        sections.push(format!("**Pathology Report Summaries:**\n{}", body));
    }
    if !context.image_analyses.is_empty() {
        let body = context
            .image_analyses
            .iter()
            .map(|img| format!("File: {}\n{}", img.file_name, pretty(img)))
            .collect::<Vec<_>>()
            .join("\n---\n");
        sections.push(format!("**Medical Scan Summaries:**\n{}", body));
    }
    if let Some(report) = &context.synthesis_report {
        sections.push(format!("**Integrated Synthesis:**\n{}", report));
    }

    let history = history
        .iter()
        .map(|msg| {
            let speaker = match msg.role {
                ChatRole::User => "User",
                ChatRole::Model => "Assistant",
            };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let directive = directive_block("Initial Analyst Directive (provided before analysis)", directive);

    format!(
        r#"You are an expert oncology AI assistant. Your purpose is to answer questions based *only* on the provided analysis data from a patient's case file. Do not use external knowledge or make assumptions beyond what is in the context.

{directive}
**Available Analysis Context:**
{context}

**Conversation History:**
{history}

**New User Question:**
{question}

Based only on the information above, provide a concise and accurate answer. If the answer cannot be found in the provided context, state that clearly."#,
        context = sections.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_schema_required_fields() {
        let schema = document_response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"isReportValid"));
        assert!(required.contains(&"validityReasoning"));
        assert_eq!(required.len(), 8);
    }

    #[test]
    fn test_image_schema_region_keys() {
        let schema = image_response_schema();
        let props = &schema["properties"]["regionsOfInterest"]["items"]["properties"];
        for key in ["label", "probability", "x_min", "y_min", "x_max", "y_max"] {
            assert!(props.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_build_synthesis_prompt_lists_files_and_sections() {
        let docs = vec![DocumentAnalysis {
            file_name: "pathology.pdf".into(),
            is_report_valid: true,
            ..Default::default()
        }];
        let imgs = vec![ImageAnalysis {
            file_name: "ct_chest.png".into(),
            is_scan_valid: true,
            ..Default::default()
        }];

        let prompt = build_synthesis_prompt(&docs, &imgs, None);
        assert!(prompt.contains("--- Report: pathology.pdf ---"));
        assert!(prompt.contains("--- Scan: ct_chest.png ---"));
        assert!(prompt.contains("(1 reports)"));
        for section in SYNTHESIS_SECTIONS {
            assert!(prompt.contains(&format!("**\"{}\"**", section)), "missing section {}", section);
        }
        assert!(!prompt.contains("Analyst Directive:"));
    }

    #[test]
    fn test_build_synthesis_prompt_with_directive() {
        let prompt = build_synthesis_prompt(&[], &[], Some("Focus on HER2 status"));
        assert!(prompt.contains("**Analyst Directive:**\nFocus on HER2 status"));
    }

    #[test]
    fn test_build_chat_prompt_includes_context_and_history() {
        let context = AnalysisContext {
            document_analyses: vec![DocumentAnalysis {
                file_name: "report.pdf".into(),
                patient_name: "Jane Doe".into(),
                ..Default::default()
            }],
            image_analyses: vec![],
            synthesis_report: Some("Integrated Summary: stable".into()),
        };
        let history = vec![ChatMessage::user("What stage?")];

        let prompt = build_chat_prompt(&context, &history, "What stage?", None);
        assert!(prompt.contains("**Pathology Report Summaries:**"));
        assert!(prompt.contains("File: report.pdf"));
        assert!(!prompt.contains("**Medical Scan Summaries:**"));
        assert!(prompt.contains("**Integrated Synthesis:**\nIntegrated Summary: stable"));
        assert!(prompt.contains("User: What stage?"));
        assert!(prompt.contains("cannot be found in the provided context"));
    }
}
