//! イベントループ
//!
//! セッションを唯一所有し、コマンドを tokio タスクとして実行して
//! 結果をイベントとしてセッションへ戻す。セッションを書き換えるのはここだけ。

use super::case::CaseId;
use super::state::{AnalysisReply, Command, Event, Session};
use crate::gateway::AnalysisGateway;
use cancerx_common::CaseCategory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error};

/// 実行中タスクが何の応答を待たれているか
///
/// タスクが結果を返さずに終わったとき、失敗の決着イベントを作るのに使う
#[derive(Debug, Clone, Copy)]
enum Pending {
    Analysis(CaseId),
    Synthesis(u64),
    Chat(u64),
}

impl Pending {
    fn failed(self, reason: String) -> Event {
        match self {
            Pending::Analysis(id) => Event::AnalysisSettled { id, reply: AnalysisReply::Failed(reason) },
            Pending::Synthesis(token) => Event::SynthesisSettled { token, result: Err(reason) },
            Pending::Chat(request_id) => Event::ChatSettled { request_id, result: Err(reason) },
        }
    }
}

pub struct SessionDriver {
    session: Session,
    gateway: Arc<dyn AnalysisGateway>,
    analysis_permits: Arc<Semaphore>,
    tasks: JoinSet<Event>,
    pending: HashMap<task::Id, Pending>,
}

impl SessionDriver {
    /// `max_concurrent_analyses` はファイル解析の同時実行数（0 は 1 とみなす）
    pub fn new(gateway: Arc<dyn AnalysisGateway>, max_concurrent_analyses: usize) -> Self {
        Self {
            session: Session::new(),
            gateway,
            analysis_permits: Arc::new(Semaphore::new(max_concurrent_analyses.max(1))),
            tasks: JoinSet::new(),
            pending: HashMap::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 実行中の外部呼び出しが無いか
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// ユーザー操作を適用し、生じた外部呼び出しを開始する
    pub fn dispatch(&mut self, event: Event) {
        let commands = self.session.apply(event);
        for command in commands {
            self.spawn(command);
        }
    }

    /// 外部呼び出しを1件待って適用し、そのイベントを返す
    ///
    /// 実行中のものが無ければ `None`。
    /// パニック等で結果を返さなかったタスクは失敗として決着させる
    pub async fn next_settled(&mut self) -> Option<Event> {
        loop {
            let event = match self.tasks.join_next_with_id().await? {
                Ok((task_id, event)) => {
                    self.pending.remove(&task_id);
                    event
                }
                Err(e) => match self.pending.remove(&e.id()) {
                    Some(pending) => {
                        error!(error = %e, ?pending, "外部呼び出しタスクが異常終了");
                        pending.failed(format!("外部呼び出しタスクが異常終了: {}", e))
                    }
                    None => {
                        error!(error = %e, "未登録のタスクが異常終了");
                        continue;
                    }
                },
            };
            self.dispatch(event.clone());
            return Some(event);
        }
    }

    /// 外部呼び出しがすべて終わるまでループを回す
    ///
    /// `on_settled` は結果を適用した直後のセッションとともに呼ばれる
    pub async fn run_until_idle<F>(&mut self, mut on_settled: F)
    where
        F: FnMut(&Session, &Event),
    {
        while let Some(event) = self.next_settled().await {
            on_settled(&self.session, &event);
        }
    }

    fn spawn(&mut self, command: Command) {
        let gateway = Arc::clone(&self.gateway);

        match command {
            Command::Analyze { id, category, file } => {
                let permits = Arc::clone(&self.analysis_permits);
                debug!(%id, file = %file.name, "解析タスク開始");
                let handle = self.tasks.spawn(async move {
                    let reply = match permits.acquire_owned().await {
                        Ok(_permit) => match category {
                            CaseCategory::Document => match gateway.analyze_document(&file).await {
                                Ok(doc) => AnalysisReply::Document(doc),
                                Err(e) => AnalysisReply::Failed(e.to_string()),
                            },
                            CaseCategory::Image => match gateway.analyze_image(&file).await {
                                Ok(img) => AnalysisReply::Image(img),
                                Err(e) => AnalysisReply::Failed(e.to_string()),
                            },
                        },
                        Err(e) => AnalysisReply::Failed(e.to_string()),
                    };
                    Event::AnalysisSettled { id, reply }
                });
                self.pending.insert(handle.id(), Pending::Analysis(id));
            }
            Command::Synthesize { token, documents, images } => {
                debug!(token, "統合タスク開始");
                let handle = self.tasks.spawn(async move {
                    let result = gateway
                        .synthesize(&documents, &images)
                        .await
                        .map_err(|e| e.to_string());
                    Event::SynthesisSettled { token, result }
                });
                self.pending.insert(handle.id(), Pending::Synthesis(token));
            }
            Command::AskQuestion { request_id, context, transcript, question } => {
                debug!(request_id, "質疑応答タスク開始");
                let handle = self.tasks.spawn(async move {
                    let result = gateway
                        .answer_question(&context, &transcript, &question)
                        .await
                        .map_err(|e| e.to_string());
                    Event::ChatSettled { request_id, result }
                });
                self.pending.insert(handle.id(), Pending::Chat(request_id));
            }
        }
    }
}
