//! ターミナルホスト
//!
//! セッションへの入力（ファイル追加・選択・質問）をイベントに変換し、
//! 外部呼び出しが落ち着くまでループを回して結果を表示する。

use crate::error::Result;
use crate::render;
use crate::report::SessionSnapshot;
use crate::scanner::{scan_paths, ScanReport};
use crate::session::{CaseStatus, Event, PreviewSlot, Session, SessionDriver};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// 実行中の外部呼び出し数（解析中ケース + 統合 + 質問）
fn pending_calls(session: &Session) -> u64 {
    let analyzing = session
        .cases()
        .iter()
        .filter(|c| c.status() == CaseStatus::Analyzing)
        .count();
    (analyzing + session.synthesis().is_loading() as usize + session.is_chat_loading() as usize) as u64
}

fn describe(session: &Session, event: &Event) -> String {
    match event {
        Event::AnalysisSettled { id, .. } => session
            .case(*id)
            .map(|c| format!("{} ({})", c.file_name(), c.status().as_str()))
            .unwrap_or_default(),
        Event::SynthesisSettled { .. } => "統合レポート".to_string(),
        Event::ChatSettled { .. } => "回答".to_string(),
        _ => String::new(),
    }
}

/// 外部呼び出しがすべて終わるまで進捗バーを出しながら待つ
pub async fn drive(driver: &mut SessionDriver) {
    if driver.is_idle() {
        return;
    }

    let pb = ProgressBar::new(pending_calls(driver.session()));
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    driver
        .run_until_idle(|session, event| {
            pb.inc(1);
            pb.set_length(pb.position() + pending_calls(session));
            pb.set_message(describe(session, event));
        })
        .await;

    pb.finish_and_clear();
}

/// 走査結果を表示してセッションに投入
pub fn intake(driver: &mut SessionDriver, report: ScanReport) {
    for skipped in &report.skipped {
        println!(
            "- スキップ: {} ({})",
            skipped.path.display(),
            skipped.media_type.as_deref().unwrap_or("unknown")
        );
    }
    println!("✔ {}件のファイルを受付\n", report.files.len());
    driver.dispatch(Event::FilesAdded(report.files));
}

/// analyze サブコマンド本体
pub async fn run_analyze(
    driver: &mut SessionDriver,
    paths: &[PathBuf],
    recursive: bool,
    output: Option<&Path>,
) -> Result<()> {
    println!("🔬 cancerx - 解析\n");

    println!("[1/3] ファイルをスキャン中...");
    let report = scan_paths(paths, recursive)?;
    intake(driver, report);

    println!("[2/3] AI解析中...");
    drive(driver).await;
    println!("✔ 解析完了\n");

    let session = driver.session();
    for case in session.cases().iter() {
        println!("{}\n", render::render_case(case, None));
    }

    println!("[3/3] 統合レポート");
    println!("{}\n", render::render_synthesis(session.synthesis()));

    if let Some(output) = output {
        SessionSnapshot::capture(session).write_to(output)?;
        println!("✔ セッションを保存: {}", output.display());
    }

    println!("\n✅ 完了");
    Ok(())
}

/// 選択に合わせてプレビューを更新し、詳細ペインを表示
pub fn show_selection(session: &Session, preview: &mut PreviewSlot) {
    let held = preview.sync(session);
    println!("{}\n", render::render_selection(session, held));
}
