//! ターミナル表示用のテキスト整形
//!
//! モデルが返した markdown はそのまま出力する。

use crate::session::{
    Case, CaseState, ImagePreview, Selection, Session, SynthesisState, SynthesisStatus,
};
use cancerx_common::{CaseResult, ChatMessage, ChatRole, DocumentAnalysis, ImageAnalysis, Size};
use std::fmt::Write as _;

/// オーバーレイ座標を計算する仮想表示領域
pub const PREVIEW_CONTAINER: Size = Size { width: 800.0, height: 600.0 };

pub fn render_welcome() -> String {
    "CancerX: 病理レポート（PDF/TXT/DOC/DOCX）と医用画像（JPEG/PNG/WEBP/GIF）を追加してください。\n\
     `/add <path>` で追加、`/cases` で一覧、そのほかの入力は解析結果への質問になります。"
        .to_string()
}

/// ケース一覧（選択中のケースに `>` を付ける）
pub fn render_case_list(session: &Session) -> String {
    if session.cases().is_empty() {
        return "ケースはありません".to_string();
    }

    let mut out = String::new();
    for (index, case) in session.cases().iter().enumerate() {
        let marker = if session.selection() == Selection::Case(case.id()) { ">" } else { " " };
        let _ = writeln!(
            out,
            "{} [{}] {:<32} {:<8} {}",
            marker,
            index + 1,
            case.file_name(),
            case.category(),
            case.status().as_str()
        );
    }
    out.trim_end().to_string()
}

/// 選択中の詳細ペイン
pub fn render_selection(session: &Session, preview: Option<&ImagePreview>) -> String {
    match session.selection() {
        Selection::Welcome => render_welcome(),
        Selection::Synthesis => render_synthesis(session.synthesis()),
        Selection::Case(_) => match session.selected_case() {
            Some(case) => render_case(case, preview),
            None => render_welcome(),
        },
    }
}

pub fn render_case(case: &Case, preview: Option<&ImagePreview>) -> String {
    let mut out = format!("## {}\n", case.file_name());

    let analysis = match case.state() {
        CaseState::Analyzing => {
            out.push_str("解析中...\n");
            None
        }
        CaseState::Error(reason) => {
            let _ = writeln!(out, "**Analysis Failed:** {}", reason);
            None
        }
        CaseState::Success(CaseResult::Document(doc)) => {
            out.push_str(&render_document(doc));
            None
        }
        CaseState::Success(CaseResult::Image(img)) => {
            out.push_str(&render_image(img));
            Some(img)
        }
    };

    // 解析前や失敗時も画像自体は表示する（枠は無し）
    if let Some(preview) = preview.filter(|p| p.case_id() == case.id()) {
        let empty = ImageAnalysis::default();
        out.push_str(&render_overlay(preview, analysis.unwrap_or(&empty)));
    }

    out.trim_end().to_string()
}

fn render_document(doc: &DocumentAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- Patient: {}", or_dash(&doc.patient_name));
    let _ = writeln!(out, "- Cancer Type: {}", or_dash(&doc.cancer_type));
    let _ = writeln!(out, "- Tumor Grade: {}", or_dash(&doc.tumor_grade));
    let _ = writeln!(out, "- Stage: {}", or_dash(&doc.stage));

    if !doc.biomarkers.is_empty() {
        out.push_str("\n### Biomarkers\n");
        for marker in &doc.biomarkers {
            let _ = writeln!(out, "- {}: {}", marker.name, marker.status);
        }
    }
    if !doc.key_findings.is_empty() {
        out.push_str("\n### Key Findings\n");
        for finding in &doc.key_findings {
            let _ = writeln!(out, "- {}", finding);
        }
    }
    out
}

fn render_image(img: &ImageAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", img.image_description);
    let _ = writeln!(out, "\n### Findings\n{}", img.findings_summary);

    if !img.regions_of_interest.is_empty() {
        out.push_str("\n### Regions of Interest\n");
        for roi in &img.regions_of_interest {
            let _ = writeln!(
                out,
                "- {} (x {:.2}-{:.2}, y {:.2}-{:.2})",
                roi.overlay_label(),
                roi.x_min,
                roi.x_max,
                roi.y_min,
                roi.y_max
            );
        }
    }
    out
}

fn render_overlay(preview: &ImagePreview, img: &ImageAnalysis) -> String {
    let natural = preview.natural_size();
    let displayed = preview.displayed_size(PREVIEW_CONTAINER);
    let mut out = format!(
        "\n### Overlay ({}x{} -> {:.0}x{:.0})\n",
        natural.width, natural.height, displayed.width, displayed.height
    );
    for overlay in preview.overlay(img, PREVIEW_CONTAINER) {
        let r = overlay.rect;
        let _ = writeln!(
            out,
            "- {} @ ({:.0}, {:.0}) {:.0}x{:.0}px",
            overlay.label, r.x, r.y, r.width, r.height
        );
    }
    out
}

pub fn render_synthesis(synthesis: &SynthesisState) -> String {
    match (synthesis.status(), synthesis.report()) {
        (SynthesisStatus::Loading, _) => {
            format!("統合レポートを生成中... ({}件)", synthesis.covered_count())
        }
        (_, Some(report)) => report.to_string(),
        _ => "統合レポートはまだありません".to_string(),
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    let speaker = match message.role {
        ChatRole::User => "You",
        ChatRole::Model => "CancerX",
    };
    format!("{}: {}", speaker, message.content)
}

pub fn render_transcript(transcript: &[ChatMessage]) -> String {
    transcript
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
