use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cancerx")]
#[command(about = "病理レポート・医用画像のAI解析と統合レポート生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ファイル/フォルダを解析して統合レポートを出力
    Analyze {
        /// レポート・画像ファイル、またはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// セッションのJSON出力先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 統合レポートへの解析者の指示
        #[arg(short, long)]
        directive: Option<String>,
    },

    /// 解析後に対話的に質問する
    Chat {
        /// レポート・画像ファイル、またはフォルダ（省略時は空のセッション）
        paths: Vec<PathBuf>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 統合レポートと回答への解析者の指示
        #[arg(short, long)]
        directive: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// モデル名を設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
