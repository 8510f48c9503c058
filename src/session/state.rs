//! セッション状態とイベント処理
//!
//! ケースレジストリ・統合状態・会話履歴・表示選択の4つを1つの構造体で持ち、
//! `Session::apply` だけが状態を書き換える。外部呼び出しは `Command` として返し、
//! その結果は再び `Event` として戻ってくる。

use super::case::{Case, CaseFile, CaseId, CaseRegistry, Settlement, SettleRejection};
use super::chat::ChatState;
use super::synthesis::{SynthesisAction, SynthesisState};
use cancerx_common::{
    classify, AnalysisContext, CaseCategory, CaseResult, ChatMessage, DocumentAnalysis,
    ImageAnalysis,
};
use tracing::{debug, info, warn};

/// 失敗理由が空だったときの代替文言
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// 詳細ペインに表示する対象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Welcome,
    Synthesis,
    Case(CaseId),
}

/// ゲートウェイからの解析応答
#[derive(Debug, Clone)]
pub enum AnalysisReply {
    Document(DocumentAnalysis),
    Image(ImageAnalysis),
    /// 通信・パース失敗
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Event {
    FilesAdded(Vec<CaseFile>),
    AnalysisSettled { id: CaseId, reply: AnalysisReply },
    CaseDeleted(CaseId),
    Selected(Selection),
    SynthesisSettled { token: u64, result: std::result::Result<String, String> },
    ChatSubmitted(String),
    ChatSettled { request_id: u64, result: std::result::Result<String, String> },
    Reset,
}

/// ドライバが実行する外部呼び出し
#[derive(Debug, Clone)]
pub enum Command {
    Analyze {
        id: CaseId,
        category: CaseCategory,
        file: CaseFile,
    },
    Synthesize {
        token: u64,
        documents: Vec<DocumentAnalysis>,
        images: Vec<ImageAnalysis>,
    },
    AskQuestion {
        request_id: u64,
        context: AnalysisContext,
        transcript: Vec<ChatMessage>,
        question: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    cases: CaseRegistry,
    synthesis: SynthesisState,
    chat: ChatState,
    selection: Selection,
    /// 統合・質問リクエストの通し番号（リセットでも巻き戻さない）
    next_request: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(&self) -> &CaseRegistry {
        &self.cases
    }

    pub fn case(&self, id: CaseId) -> Option<&Case> {
        self.cases.get(id)
    }

    pub fn synthesis(&self) -> &SynthesisState {
        &self.synthesis
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.chat.transcript()
    }

    pub fn is_chat_loading(&self) -> bool {
        self.chat.is_loading()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// 選択中のケース
    pub fn selected_case(&self) -> Option<&Case> {
        match self.selection {
            Selection::Case(id) => self.cases.get(id),
            _ => None,
        }
    }

    /// 質問ごとに送る文脈（成功した解析すべて + 現在の統合レポート）
    pub fn analysis_context(&self) -> AnalysisContext {
        let (document_analyses, image_analyses) = self.cases.partition_successful();
        AnalysisContext {
            document_analyses,
            image_analyses,
            synthesis_report: self.synthesis.context_report().map(str::to_string),
        }
    }

    /// イベントを1件適用し、実行すべき外部呼び出しを返す
    ///
    /// 適用のたびに統合の再評価と選択の検証を行う
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        let mut commands = match event {
            Event::FilesAdded(files) => self.intake(files),
            Event::AnalysisSettled { id, reply } => {
                self.settle_analysis(id, reply);
                Vec::new()
            }
            Event::CaseDeleted(id) => {
                self.delete(id);
                Vec::new()
            }
            Event::Selected(selection) => {
                self.selection = selection;
                Vec::new()
            }
            Event::SynthesisSettled { token, result } => {
                if self.synthesis.settle(token, result) {
                    info!(token, failed = self.synthesis.failed(), "統合レポート確定");
                    self.selection = Selection::Synthesis;
                } else {
                    debug!(token, "古い統合結果を破棄");
                }
                Vec::new()
            }
            Event::ChatSubmitted(question) => self.submit_question(&question).into_iter().collect(),
            Event::ChatSettled { request_id, result } => {
                if !self.chat.settle(request_id, result) {
                    debug!(request_id, "古いチャット応答を破棄");
                }
                Vec::new()
            }
            Event::Reset => {
                self.reset();
                Vec::new()
            }
        };

        commands.extend(self.reconcile_synthesis());
        self.validate_selection();
        commands
    }

    fn take_request_id(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    fn intake(&mut self, files: Vec<CaseFile>) -> Vec<Command> {
        let mut commands = Vec::new();

        for file in files {
            let Some(category) = classify(&file.media_type) else {
                warn!(file = %file.name, media_type = %file.media_type, "未対応の形式のため受付しません");
                continue;
            };

            let case = Case::analyzing(file.clone(), category);
            let id = self.cases.insert(case);
            self.selection = Selection::Case(id);
            info!(%id, file = %file.name, %category, "解析開始");

            commands.push(Command::Analyze { id, category, file });
        }

        commands
    }

    fn settle_analysis(&mut self, id: CaseId, reply: AnalysisReply) {
        let Some(file_name) = self.cases.get(id).map(|c| c.file_name().to_string()) else {
            debug!(%id, "削除済みケースの解析結果を破棄");
            return;
        };

        let settlement = match reply {
            AnalysisReply::Document(doc) if !doc.is_report_valid => {
                Settlement::Error(non_empty_reason(doc.validity_reasoning))
            }
            AnalysisReply::Document(doc) => {
                Settlement::Success(CaseResult::Document(DocumentAnalysis { file_name, ..doc }))
            }
            AnalysisReply::Image(img) if !img.is_scan_valid => {
                Settlement::Error(non_empty_reason(img.validity_reasoning))
            }
            AnalysisReply::Image(img) => {
                Settlement::Success(CaseResult::Image(ImageAnalysis { file_name, ..img }))
            }
            AnalysisReply::Failed(reason) => Settlement::Error(non_empty_reason(reason)),
        };

        match self.cases.settle(id, settlement) {
            Ok(case) => match case.error_reason() {
                Some(reason) => warn!(%id, file = %case.file_name(), reason, "解析失敗"),
                None => info!(%id, file = %case.file_name(), "解析成功"),
            },
            Err(SettleRejection::AlreadySettled) => warn!(%id, "確定済みケースへの重複応答を無視"),
            Err(SettleRejection::Unknown) => debug!(%id, "削除済みケースの解析結果を破棄"),
        }
    }

    fn delete(&mut self, id: CaseId) {
        if self.cases.remove(id).is_some() {
            info!(%id, "ケース削除");
            if self.selection == Selection::Case(id) {
                self.selection = Selection::Welcome;
            }
        }
    }

    fn submit_question(&mut self, question: &str) -> Option<Command> {
        if self.chat.is_loading() {
            debug!("応答待ちのため質問を無視");
            return None;
        }
        if question.trim().is_empty() {
            return None;
        }

        let request_id = self.take_request_id();
        let context = self.analysis_context();
        let question = self.chat.submit(request_id, question)?;
        Some(Command::AskQuestion {
            request_id,
            context,
            transcript: self.chat.transcript().to_vec(),
            question,
        })
    }

    fn reconcile_synthesis(&mut self) -> Option<Command> {
        let success_count = self.cases.success_count();

        match self.synthesis.plan(self.cases.any_analyzing(), success_count) {
            SynthesisAction::Defer | SynthesisAction::Steady => None,
            SynthesisAction::Reset => {
                self.synthesis.reset();
                if self.selection == Selection::Synthesis {
                    self.selection = Selection::Welcome;
                }
                None
            }
            SynthesisAction::Start => {
                let token = self.take_request_id();
                self.synthesis.begin(token, success_count);
                let (documents, images) = self.cases.partition_successful();
                info!(token, documents = documents.len(), images = images.len(), "統合レポート生成開始");
                Some(Command::Synthesize { token, documents, images })
            }
        }
    }

    /// 選択が存在しないケースを指していれば welcome に戻す
    fn validate_selection(&mut self) {
        if let Selection::Case(id) = self.selection {
            if !self.cases.contains(id) {
                self.selection = Selection::Welcome;
            }
        }
    }

    /// 全状態を初期値へ（1回の代入で置き換える）
    fn reset(&mut self) {
        info!("セッションをリセット");
        *self = Self {
            next_request: self.next_request,
            ..Self::default()
        };
    }
}

fn non_empty_reason(reason: String) -> String {
    if reason.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        reason
    }
}
