//! 表示中画像のデコード済みプレビュー
//!
//! プレビューは選択中の画像ケース1件分だけ保持する。選択が外れた時点、
//! ケースが削除された時点、リセット時点で解放される（Drop）。

use super::case::CaseId;
use super::state::Session;
use crate::error::{CancerXError, Result};
use cancerx_common::{fit_contain, CaseCategory, ImageAnalysis, PixelRect, Size};
use image::DynamicImage;
use tracing::{debug, warn};

/// オーバーレイ1件分（ラベルとピクセル矩形）
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub label: String,
    pub rect: PixelRect,
}

/// デコード済み画像のハンドル
#[derive(Debug)]
pub struct ImagePreview {
    case_id: CaseId,
    image: DynamicImage,
}

impl ImagePreview {
    /// 画像バイト列をデコードして取得
    pub fn acquire(case_id: CaseId, bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CancerXError::ImageLoad(format!("{}: {}", case_id, e)))?;
        debug!(%case_id, width = image.width(), height = image.height(), "プレビュー取得");
        Ok(Self { case_id, image })
    }

    pub fn case_id(&self) -> CaseId {
        self.case_id
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.image.width() as f64, self.image.height() as f64)
    }

    /// 表示領域に収めたときのサイズ
    pub fn displayed_size(&self, container: Size) -> Size {
        fit_contain(self.natural_size(), container)
    }

    /// 関心領域を表示サイズ上の矩形に変換
    pub fn overlay(&self, analysis: &ImageAnalysis, container: Size) -> Vec<OverlayBox> {
        let displayed = self.displayed_size(container);
        if displayed.is_empty() {
            return Vec::new();
        }

        analysis
            .regions_of_interest
            .iter()
            .map(|roi| OverlayBox {
                label: roi.overlay_label(),
                rect: roi.to_pixel_rect(displayed),
            })
            .collect()
    }
}

impl Drop for ImagePreview {
    fn drop(&mut self) {
        debug!(case_id = %self.case_id, "プレビュー解放");
    }
}

/// 表示中プレビューの置き場（最大1件）
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<ImagePreview>,
}

impl PreviewSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ImagePreview> {
        self.current.as_ref()
    }

    /// セッションの選択に合わせてプレビューを取得・解放する
    ///
    /// 選択が画像ケースを指していれば解析状態に関わらずそのプレビューを保持し、
    /// それ以外なら手放す。デコード失敗はプレビュー無しとして扱う
    pub fn sync(&mut self, session: &Session) -> Option<&ImagePreview> {
        let target = session
            .selected_case()
            .filter(|case| case.category() == CaseCategory::Image);

        let Some(case) = target else {
            self.current = None;
            return None;
        };

        let held = self.current.as_ref().map(|p| p.case_id());
        if held != Some(case.id()) {
            // 新しいハンドルを取る前に古いものを解放
            self.current = None;
            match ImagePreview::acquire(case.id(), &case.file().bytes) {
                Ok(preview) => self.current = Some(preview),
                Err(e) => warn!(file = %case.file_name(), error = %e, "プレビューを作成できません"),
            }
        }

        self.current.as_ref()
    }
}
