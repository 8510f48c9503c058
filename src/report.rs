//! セッションのJSONスナップショット出力
//!
//! 書き出しのみで、読み戻してセッションを復元することはない。

use crate::error::Result;
use crate::session::{CaseId, CaseStatus, Session, SynthesisStatus};
use cancerx_common::{CaseCategory, CaseResult, ChatMessage};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub exported_at: DateTime<Local>,
    pub cases: Vec<CaseSnapshot>,
    pub synthesis: SynthesisSnapshot,
    pub transcript: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSnapshot {
    pub id: CaseId,
    pub file_name: String,
    pub media_type: String,
    pub category: CaseCategory,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CaseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisSnapshot {
    pub status: SynthesisStatus,
    pub report: Option<String>,
    pub covered_count: usize,
    pub failed: bool,
}

impl SessionSnapshot {
    pub fn capture(session: &Session) -> Self {
        let cases = session
            .cases()
            .iter()
            .map(|case| CaseSnapshot {
                id: case.id(),
                file_name: case.file_name().to_string(),
                media_type: case.file().media_type.clone(),
                category: case.category(),
                status: case.status(),
                result: case.result().cloned(),
                error: case.error_reason().map(str::to_string),
            })
            .collect();

        let synthesis = session.synthesis();
        Self {
            exported_at: Local::now(),
            cases,
            synthesis: SynthesisSnapshot {
                status: synthesis.status(),
                report: synthesis.report().map(str::to_string),
                covered_count: synthesis.covered_count(),
                failed: synthesis.failed(),
            },
            transcript: session.transcript().to_vec(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
