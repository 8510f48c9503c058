//! 関心領域オーバーレイの座標計算
//!
//! 表示領域に収まるよう縦横比を保って画像を縮小し、
//! 正規化座標のバウンディングボックスをピクセル矩形に変換する。

use crate::types::RegionOfInterest;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 縦横比を保ったまま表示領域に収まる表示サイズ
///
/// どちらかのサイズが空なら (0, 0)
pub fn fit_contain(natural: Size, container: Size) -> Size {
    if natural.is_empty() || container.is_empty() {
        return Size::default();
    }

    let image_ratio = natural.width / natural.height;
    let container_ratio = container.width / container.height;

    if image_ratio > container_ratio {
        Size::new(container.width, container.width / image_ratio)
    } else {
        Size::new(container.height * image_ratio, container.height)
    }
}

impl RegionOfInterest {
    /// 表示サイズ上のピクセル矩形
    pub fn to_pixel_rect(&self, displayed: Size) -> PixelRect {
        let r = self.normalized();
        PixelRect {
            x: r.x_min * displayed.width,
            y: r.y_min * displayed.height,
            width: (r.x_max - r.x_min) * displayed.width,
            height: (r.y_max - r.y_min) * displayed.height,
        }
    }

    /// "ラベル: 87%" 形式のオーバーレイ表記
    pub fn overlay_label(&self) -> String {
        format!("{}: {:.0}%", self.label, self.normalized().probability * 100.0)
    }
}
