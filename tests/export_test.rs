//! セッションJSON出力の統合テスト

use cancerx::report::SessionSnapshot;
use cancerx::session::{AnalysisReply, CaseFile, Command, Event, Session};
use cancerx_common::{DocumentAnalysis, ImageAnalysis, RegionOfInterest};
use tempfile::tempdir;

fn analyzed_session() -> Session {
    let mut session = Session::new();
    let commands = session.apply(Event::FilesAdded(vec![
        CaseFile::new("report.pdf", "application/pdf", b"%PDF".to_vec()),
        CaseFile::new("car.jpg", "image/jpeg", b"jpg".to_vec()),
        CaseFile::new("ct.png", "image/png", b"png".to_vec()),
    ]));
    let ids: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::Analyze { id, .. } => Some(*id),
            _ => None,
        })
        .collect();

    session.apply(Event::AnalysisSettled {
        id: ids[0],
        reply: AnalysisReply::Document(DocumentAnalysis {
            is_report_valid: true,
            patient_name: "Jane Doe".into(),
            ..Default::default()
        }),
    });
    session.apply(Event::AnalysisSettled {
        id: ids[1],
        reply: AnalysisReply::Image(ImageAnalysis {
            is_scan_valid: false,
            validity_reasoning: "This is a photo of a car.".into(),
            ..Default::default()
        }),
    });
    let commands = session.apply(Event::AnalysisSettled {
        id: ids[2],
        reply: AnalysisReply::Image(ImageAnalysis {
            is_scan_valid: true,
            regions_of_interest: vec![RegionOfInterest {
                label: "Nodule".into(),
                probability: 0.9,
                x_min: 0.1,
                y_min: 0.1,
                x_max: 0.3,
                y_max: 0.3,
            }],
            ..Default::default()
        }),
    });
    let token = commands
        .iter()
        .find_map(|c| match c {
            Command::Synthesize { token, .. } => Some(*token),
            _ => None,
        })
        .expect("synthesis should start");
    session.apply(Event::SynthesisSettled { token, result: Ok("## Integrated Summary".into()) });
    session
}

#[test]
fn test_snapshot_written_as_json() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("out").join("session.json");

    let session = analyzed_session();
    SessionSnapshot::capture(&session)
        .write_to(&output_path)
        .expect("JSON出力に失敗");
    assert!(output_path.exists(), "JSONファイルが作成されていない");

    let content = std::fs::read_to_string(&output_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();

    assert!(json["exportedAt"].is_string());

    let cases = json["cases"].as_array().unwrap();
    assert_eq!(cases.len(), 3);
    assert_eq!(cases[0]["fileName"], "report.pdf");
    assert_eq!(cases[0]["status"], "success");
    assert_eq!(cases[0]["result"]["kind"], "document");
    assert_eq!(cases[0]["result"]["fileName"], "report.pdf");
    assert!(cases[0].get("error").is_none());

    assert_eq!(cases[1]["status"], "error");
    assert_eq!(cases[1]["error"], "This is a photo of a car.");
    assert!(cases[1].get("result").is_none());

    assert_eq!(cases[2]["category"], "image");
    assert_eq!(cases[2]["result"]["regionsOfInterest"][0]["x_min"], 0.1);

    assert_eq!(json["synthesis"]["status"], "done");
    assert_eq!(json["synthesis"]["coveredCount"], 2);
    assert_eq!(json["synthesis"]["report"], "## Integrated Summary");
    assert_eq!(json["synthesis"]["failed"], false);
    assert_eq!(json["transcript"].as_array().unwrap().len(), 0);
}

#[test]
fn test_snapshot_of_empty_session() {
    let snapshot = SessionSnapshot::capture(&Session::new());
    let json = serde_json::to_value(&snapshot).unwrap();

    assert!(json["cases"].as_array().unwrap().is_empty());
    assert_eq!(json["synthesis"]["status"], "idle");
    assert!(json["synthesis"]["report"].is_null());
}
