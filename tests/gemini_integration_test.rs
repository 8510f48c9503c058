use cancerx::config::Config;
use cancerx::gateway::{AnalysisGateway, GeminiGateway};
use cancerx::session::CaseFile;
use cancerx_common::{AnalysisContext, ChatMessage, NO_SYNTHESIS_DATA_MESSAGE};

const SAMPLE_REPORT: &str = "SURGICAL PATHOLOGY REPORT
Patient: Jane Doe
Specimen: Left breast, lumpectomy
Diagnosis: Invasive ductal carcinoma, Nottingham grade 2
Pathologic stage: pT2 pN0
ER: Positive (95%)  PR: Positive (80%)  HER2: Negative (1+)
Margins: Negative, closest 4 mm";

fn gateway() -> Option<GeminiGateway> {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            Some(GeminiGateway::new(&Config::default(), key).expect("client build failed"))
        }
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            None
        }
    }
}

#[tokio::test]
async fn gemini_document_synthesis_chat_integration() {
    let Some(gateway) = gateway() else {
        return;
    };

    let file = CaseFile::new("integration-report.txt", "text/plain", SAMPLE_REPORT.as_bytes().to_vec());
    let mut doc = gateway.analyze_document(&file).await.expect("document analysis failed");
    assert!(doc.is_report_valid, "report judged invalid: {}", doc.validity_reasoning);
    assert!(doc.patient_name.contains("Jane"));
    doc.file_name = file.name.clone();

    let report = gateway
        .synthesize(std::slice::from_ref(&doc), &[])
        .await
        .expect("synthesis failed");
    assert!(!report.trim().is_empty());
    assert_ne!(report, NO_SYNTHESIS_DATA_MESSAGE);

    let context = AnalysisContext {
        document_analyses: vec![doc],
        image_analyses: Vec::new(),
        synthesis_report: Some(report),
    };
    let question = "What is the HER2 status?";
    let answer = gateway
        .answer_question(&context, &[ChatMessage::user(question)], question)
        .await
        .expect("chat failed");
    assert!(answer.to_lowercase().contains("negative"));
}
