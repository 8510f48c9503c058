//! ケース（アップロード1ファイル）とケースレジストリ
//!
//! 状態遷移は analyzing → success | error のみ。終端状態からの遷移は削除だけ。

use cancerx_common::{CaseCategory, CaseResult, DocumentAnalysis, ImageAnalysis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// ケースID（受付時に生成、以後不変）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(Uuid);

impl CaseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// アップロードされた元ファイル（不変）
#[derive(Debug, Clone)]
pub struct CaseFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl CaseFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Analyzing,
    Success,
    Error,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Analyzing => "analyzing",
            CaseStatus::Success => "success",
            CaseStatus::Error => "error",
        }
    }
}

/// 結果とエラー理由は対応する終端状態でのみ保持する
#[derive(Debug, Clone, PartialEq)]
pub enum CaseState {
    Analyzing,
    Success(CaseResult),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct Case {
    id: CaseId,
    file: CaseFile,
    category: CaseCategory,
    state: CaseState,
}

impl Case {
    /// 受付直後のケース（pending を経ずに analyzing で登録される）
    pub fn analyzing(file: CaseFile, category: CaseCategory) -> Self {
        Self {
            id: CaseId::generate(),
            file,
            category,
            state: CaseState::Analyzing,
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn file(&self) -> &CaseFile {
        &self.file
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    pub fn category(&self) -> CaseCategory {
        self.category
    }

    pub fn state(&self) -> &CaseState {
        &self.state
    }

    pub fn status(&self) -> CaseStatus {
        match self.state {
            CaseState::Analyzing => CaseStatus::Analyzing,
            CaseState::Success(_) => CaseStatus::Success,
            CaseState::Error(_) => CaseStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&CaseResult> {
        match &self.state {
            CaseState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_reason(&self) -> Option<&str> {
        match &self.state {
            CaseState::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// ケース確定時の結果
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Success(CaseResult),
    Error(String),
}

/// 確定できなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleRejection {
    /// 削除済み・リセット済み
    Unknown,
    /// 既に終端状態
    AlreadySettled,
}

/// アップロード順を保持するケースの集合
#[derive(Debug, Clone, Default)]
pub struct CaseRegistry {
    cases: Vec<Case>,
}

impl CaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, case: Case) -> CaseId {
        let id = case.id;
        debug_assert!(self.get(id).is_none(), "case id collision: {}", id);
        self.cases.push(case);
        id
    }

    pub fn get(&self, id: CaseId) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: CaseId) -> bool {
        self.get(id).is_some()
    }

    /// 無条件に削除。他ケースの状態には触れない
    pub fn remove(&mut self, id: CaseId) -> Option<Case> {
        let index = self.cases.iter().position(|c| c.id == id)?;
        Some(self.cases.remove(index))
    }

    /// analyzing のケースを終端状態へ遷移させる
    ///
    /// 対象ケースだけを置き換えるので、並行して確定する別ケースを上書きしない
    pub fn settle(&mut self, id: CaseId, settlement: Settlement) -> std::result::Result<&Case, SettleRejection> {
        let case = self
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SettleRejection::Unknown)?;

        if case.state != CaseState::Analyzing {
            return Err(SettleRejection::AlreadySettled);
        }

        case.state = match settlement {
            Settlement::Success(result) => CaseState::Success(result),
            Settlement::Error(reason) => CaseState::Error(reason),
        };
        Ok(case)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Case> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// アップロード順で n 番目（0始まり）のケース
    pub fn nth(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    pub fn any_analyzing(&self) -> bool {
        self.cases.iter().any(|c| c.status() == CaseStatus::Analyzing)
    }

    pub fn success_count(&self) -> usize {
        self.cases.iter().filter(|c| c.status() == CaseStatus::Success).count()
    }

    /// 成功したケースをレポート解析と画像解析に分ける
    pub fn partition_successful(&self) -> (Vec<DocumentAnalysis>, Vec<ImageAnalysis>) {
        let mut documents = Vec::new();
        let mut images = Vec::new();

        for result in self.cases.iter().filter_map(|c| c.result()) {
            match result {
                CaseResult::Document(doc) => documents.push(doc.clone()),
                CaseResult::Image(img) => images.push(img.clone()),
            }
        }

        (documents, images)
    }
}
