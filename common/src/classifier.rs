//! MIMEタイプによるケース区分判定
//!
//! ホワイトリストに含まれないファイルはレジストリに登録しない。

use crate::types::CaseCategory;

/// レポートとして受け付けるMIMEタイプ
pub const SUPPORTED_DOC_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

/// 画像として受け付けるMIMEタイプ
pub const SUPPORTED_IMG_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// MIMEタイプからケース区分を判定
///
/// パラメータ（`; charset=utf-8` など）と大文字小文字は無視する。
/// どちらのホワイトリストにも無ければ `None`。
pub fn classify(media_type: &str) -> Option<CaseCategory> {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if SUPPORTED_DOC_TYPES.contains(&essence.as_str()) {
        Some(CaseCategory::Document)
    } else if SUPPORTED_IMG_TYPES.contains(&essence.as_str()) {
        Some(CaseCategory::Image)
    } else {
        None
    }
}

/// 受付可能なMIMEタイプか
pub fn is_supported(media_type: &str) -> bool {
    classify(media_type).is_some()
}
