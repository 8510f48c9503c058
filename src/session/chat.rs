//! 質疑応答の会話履歴
//!
//! 履歴は追記のみ。同時に飛ばせる質問は1件だけ（キューイングしない）。

use cancerx_common::ChatMessage;

/// 応答が空だったときの代替メッセージ
pub const CHAT_FALLBACK_ERROR: &str = "Sorry, I couldn't get a response.";

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    transcript: Vec<ChatMessage>,
    in_flight: Option<u64>,
}

impl ChatState {
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 質問を受け付け、ユーザーのターンを先に追記する
    ///
    /// 応答待ちの質問があるか、空の質問なら何もせず `None`。
    /// 受け付けた場合は送信する質問文（前後空白除去済み）を返す
    pub fn submit(&mut self, request_id: u64, question: &str) -> Option<String> {
        if self.is_loading() {
            return None;
        }
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.transcript.push(ChatMessage::user(question));
        self.in_flight = Some(request_id);
        Some(question.to_string())
    }

    /// 応答を反映。待っているリクエストでなければ無視して false
    ///
    /// 失敗はエラー表記のモデルターンとして追記し、例外にはしない
    pub fn settle(&mut self, request_id: u64, result: std::result::Result<String, String>) -> bool {
        if self.in_flight != Some(request_id) {
            return false;
        }

        let content = match result {
            Ok(answer) => answer,
            Err(reason) => {
                let reason = if reason.trim().is_empty() {
                    CHAT_FALLBACK_ERROR.to_string()
                } else {
                    reason
                };
                format!("**Error:** {}", reason)
            }
        };
        self.transcript.push(ChatMessage::model(content));
        self.in_flight = None;
        true
    }
}
