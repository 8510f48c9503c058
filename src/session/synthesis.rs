//! 統合レポートの派生状態
//!
//! 成功ケース数が最後に統合した件数と食い違ったときだけ再統合する。
//! 解析中のケースがある間と、統合リクエストが飛んでいる間は判断を保留する。

use serde::{Deserialize, Serialize};

/// 統合失敗時にレポートの先頭に付く印
pub const SYNTHESIS_ERROR_PREFIX: &str = "**Error:** Synthesis failed: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
    #[default]
    Idle,
    Loading,
    Done,
}

/// 再評価の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisAction {
    /// 解析中ケースあり、または統合中
    Defer,
    /// 成功ケースが無くなった
    Reset,
    /// 件数が変わったので再統合
    Start,
    /// 変化なし
    Steady,
}

#[derive(Debug, Clone, Default)]
pub struct SynthesisState {
    status: SynthesisStatus,
    report: Option<String>,
    covered_count: usize,
    failed: bool,
    in_flight: Option<u64>,
}

impl SynthesisState {
    pub fn status(&self) -> SynthesisStatus {
        self.status
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// 直近の統合に寄与した成功ケース数
    pub fn covered_count(&self) -> usize {
        self.covered_count
    }

    /// 直近の統合が失敗してエラー付きレポートになっているか
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn is_loading(&self) -> bool {
        self.status == SynthesisStatus::Loading
    }

    /// チャットの文脈に含めるレポート（エラー付きレポートは除く）
    pub fn context_report(&self) -> Option<&str> {
        if self.failed {
            None
        } else {
            self.report()
        }
    }

    /// レジストリ変更後の再評価
    pub fn plan(&self, any_analyzing: bool, success_count: usize) -> SynthesisAction {
        if any_analyzing {
            return SynthesisAction::Defer;
        }
        if success_count == 0 {
            return SynthesisAction::Reset;
        }
        if self.is_loading() {
            return SynthesisAction::Defer;
        }
        if success_count != self.covered_count {
            SynthesisAction::Start
        } else {
            SynthesisAction::Steady
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 統合開始。件数はここで記録し、再突入を防ぐ
    pub fn begin(&mut self, token: u64, success_count: usize) {
        self.status = SynthesisStatus::Loading;
        self.covered_count = success_count;
        self.in_flight = Some(token);
    }

    /// 統合結果を反映。現在のリクエストでなければ無視して false
    pub fn settle(&mut self, token: u64, result: std::result::Result<String, String>) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }

        self.in_flight = None;
        self.status = SynthesisStatus::Done;
        match result {
            Ok(report) => {
                self.report = Some(report);
                self.failed = false;
            }
            Err(reason) => {
                self.report = Some(format!("{}{}", SYNTHESIS_ERROR_PREFIX, reason));
                self.failed = true;
            }
        }
        true
    }
}
