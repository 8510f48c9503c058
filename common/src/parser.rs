//! APIレスポンスパーサー
//!
//! モデル応答からJSON部分を抽出し、レポート/画像の解析結果をパースする

use crate::error::{Error, Result};
use crate::types::{DocumentAnalysis, ImageAnalysis};

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use cancerx_common::extract_json;
///
/// let response = "Result: {\"isReportValid\": true}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"isReportValid\": true}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::MissingJson)
}

/// レポート解析レスポンスをパース
pub fn parse_document_analysis(response: &str) -> Result<DocumentAnalysis> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("レポート解析 JSONパースエラー: {}", e)))
}

/// 画像解析レスポンスをパース
///
/// 関心領域の座標は [0, 1] に正規化する
pub fn parse_image_analysis(response: &str) -> Result<ImageAnalysis> {
    let json_str = extract_json(response)?;
    let mut analysis: ImageAnalysis = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("画像解析 JSONパースエラー: {}", e)))?;
    analysis.regions_of_interest = analysis
        .regions_of_interest
        .iter()
        .map(|r| r.normalized())
        .collect();
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =============================================
    // extract_json テスト
    // =============================================

    #[test]
    fn test_extract_json_with_block() {
        let response = r#"Here is the analysis:
```json
{"isReportValid": true, "patientName": "Jane Doe"}
```
Some additional text."#;

        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains("Jane Doe"));
    }

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"isScanValid": false}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_nested_braces() {
        let response = r#"noise {"regionsOfInterest": [{"label": "a"}]} trailing"#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"regionsOfInterest": [{"label": "a"}]}"#);
    }

    #[test]
    fn test_extract_json_error() {
        let result = extract_json("No JSON here, just plain text.");
        assert!(matches!(result, Err(Error::MissingJson)));
    }

    // =============================================
    // parse_* テスト
    // =============================================

    #[test]
    fn test_parse_document_analysis() {
        let response = r#"{
            "isReportValid": true,
            "validityReasoning": "Valid pathology report.",
            "patientName": "Jane Doe",
            "cancerType": "Invasive ductal carcinoma",
            "tumorGrade": "Grade 2",
            "stage": "pT2 N0 M0",
            "biomarkers": [{"name": "ER", "status": "Positive"}, {"name": "HER2", "status": "Negative"}],
            "keyFindings": ["Margins clear"]
        }"#;

        let doc = parse_document_analysis(response).unwrap();
        assert!(doc.is_report_valid);
        assert_eq!(doc.patient_name, "Jane Doe");
        assert_eq!(doc.biomarkers.len(), 2);
        assert_eq!(doc.biomarkers[1].name, "HER2");
        assert_eq!(doc.key_findings, vec!["Margins clear".to_string()]);
    }

    #[test]
    fn test_parse_document_analysis_invalid_report() {
        let response = r#"{"isReportValid": false, "validityReasoning": "Not a medical document"}"#;
        let doc = parse_document_analysis(response).unwrap();
        assert!(!doc.is_report_valid);
        assert_eq!(doc.validity_reasoning, "Not a medical document");
    }

    #[test]
    fn test_parse_image_analysis_normalizes_regions() {
        let response = r#"```json
{
  "isScanValid": true,
  "validityReasoning": "This is a valid CT scan of the chest.",
  "imageDescription": "Axial CT",
  "findingsSummary": "Spiculated nodule in right upper lobe.",
  "regionsOfInterest": [
    {"label": "Suspicious Nodule", "probability": 0.87, "x_min": 0.6, "y_min": 0.3, "x_max": 0.4, "y_max": 1.2}
  ]
}
```"#;

        let img = parse_image_analysis(response).unwrap();
        assert!(img.is_scan_valid);
        let roi = &img.regions_of_interest[0];
        assert_eq!(roi.x_min, 0.4);
        assert_eq!(roi.x_max, 0.6);
        assert_eq!(roi.y_max, 1.0);
    }

    #[test]
    fn test_parse_image_analysis_malformed() {
        let result = parse_image_analysis(r#"{"isScanValid": "maybe"#);
        match result {
            Err(Error::Parse(msg)) => assert!(msg.starts_with("画像解析")),
            other => panic!("Expected Parse error: {:?}", other),
        }
    }
}
