//! 対話式の質疑応答ループ
//!
//! スラッシュで始まる入力はセッション操作、それ以外は質問として送る。

use crate::error::{CancerXError, Result};
use crate::host::{drive, intake, show_selection};
use crate::render;
use crate::scanner::scan_paths;
use crate::session::{Event, PreviewSlot, Selection, SessionDriver};
use dialoguer::Input;
use std::path::PathBuf;

/// 対話アクション
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// 質問を送る
    Ask(String),
    /// ケース一覧
    Cases,
    /// n 番目（1始まり）のケースを表示
    Show(usize),
    /// 統合レポートを表示
    Synthesis,
    /// n 番目（1始まり）のケースを削除
    Delete(usize),
    /// ファイル/フォルダを追加
    Add(PathBuf),
    /// 全消去
    Reset,
    Help,
    Quit,
    /// 空行
    Nothing,
    /// 解釈できないコマンド
    Unknown(String),
}

pub const HELP: &str = "/cases 一覧  /show <n> 表示  /synthesis 統合レポート  /delete <n> 削除  /add <path> 追加  /reset 全消去  /quit 終了";

pub fn parse_chat_input(input: &str) -> ChatAction {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ChatAction::Nothing;
    }
    if !trimmed.starts_with('/') {
        return ChatAction::Ask(trimmed.to_string());
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };
    let index = || arg.parse::<usize>().ok().filter(|&n| n > 0);

    match (command, arg.is_empty()) {
        ("/cases", _) => ChatAction::Cases,
        ("/synthesis", _) => ChatAction::Synthesis,
        ("/reset", _) => ChatAction::Reset,
        ("/help", _) => ChatAction::Help,
        ("/quit" | "/exit" | "/q", _) => ChatAction::Quit,
        ("/show", false) => index().map(ChatAction::Show).unwrap_or_else(|| ChatAction::Unknown(trimmed.into())),
        ("/delete", false) => index().map(ChatAction::Delete).unwrap_or_else(|| ChatAction::Unknown(trimmed.into())),
        ("/add", false) => ChatAction::Add(PathBuf::from(arg)),
        _ => ChatAction::Unknown(trimmed.to_string()),
    }
}

fn prompt() -> Result<String> {
    Input::<String>::new()
        .with_prompt("質問 (/help)")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| CancerXError::Interactive(e.to_string()))
}

/// chat サブコマンドのループ
pub async fn run_chat(driver: &mut SessionDriver, recursive: bool) -> Result<()> {
    let mut preview = PreviewSlot::new();
    println!("{}\n{}\n", render::render_welcome(), HELP);

    loop {
        drive(driver).await;

        match parse_chat_input(&prompt()?) {
            ChatAction::Nothing => {}
            ChatAction::Help => println!("{}\n", HELP),
            ChatAction::Quit => break,
            ChatAction::Unknown(input) => println!("不明なコマンド: {}\n{}\n", input, HELP),
            ChatAction::Cases => println!("{}\n", render::render_case_list(driver.session())),
            ChatAction::Synthesis => {
                driver.dispatch(Event::Selected(Selection::Synthesis));
                show_selection(driver.session(), &mut preview);
            }
            ChatAction::Show(n) => match driver.session().cases().nth(n - 1).map(|c| c.id()) {
                Some(id) => {
                    driver.dispatch(Event::Selected(Selection::Case(id)));
                    show_selection(driver.session(), &mut preview);
                }
                None => println!("ケース {} はありません\n", n),
            },
            ChatAction::Delete(n) => match driver.session().cases().nth(n - 1).map(|c| c.id()) {
                Some(id) => {
                    driver.dispatch(Event::CaseDeleted(id));
                    preview.sync(driver.session());
                    println!("✔ 削除しました\n");
                }
                None => println!("ケース {} はありません\n", n),
            },
            ChatAction::Add(path) => match scan_paths(&[path], recursive) {
                Ok(report) => {
                    intake(driver, report);
                    drive(driver).await;
                    println!("{}\n", render::render_case_list(driver.session()));
                }
                Err(e) => println!("❌ {}\n", e),
            },
            ChatAction::Reset => {
                driver.dispatch(Event::Reset);
                preview.sync(driver.session());
                println!("✔ セッションをリセットしました\n");
            }
            ChatAction::Ask(question) => {
                driver.dispatch(Event::ChatSubmitted(question));
                drive(driver).await;
                if let Some(answer) = driver.session().transcript().last() {
                    println!("{}\n", render::render_message(answer));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_question() {
        assert_eq!(parse_chat_input("  What is the stage? "), ChatAction::Ask("What is the stage?".into()));
        assert_eq!(parse_chat_input("   "), ChatAction::Nothing);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_chat_input("/cases"), ChatAction::Cases);
        assert_eq!(parse_chat_input("/show 2"), ChatAction::Show(2));
        assert_eq!(parse_chat_input("/delete  1"), ChatAction::Delete(1));
        assert_eq!(parse_chat_input("/synthesis"), ChatAction::Synthesis);
        assert_eq!(parse_chat_input("/reset"), ChatAction::Reset);
        assert_eq!(parse_chat_input("/quit"), ChatAction::Quit);
        assert_eq!(
            parse_chat_input("/add scans/ct 1.png"),
            ChatAction::Add(PathBuf::from("scans/ct 1.png"))
        );
    }

    #[test]
    fn test_invalid_commands() {
        assert_eq!(parse_chat_input("/show 0"), ChatAction::Unknown("/show 0".into()));
        assert_eq!(parse_chat_input("/show x"), ChatAction::Unknown("/show x".into()));
        assert_eq!(parse_chat_input("/delete"), ChatAction::Unknown("/delete".into()));
        assert_eq!(parse_chat_input("/add"), ChatAction::Unknown("/add".into()));
        assert_eq!(parse_chat_input("/frobnicate"), ChatAction::Unknown("/frobnicate".into()));
    }
}
