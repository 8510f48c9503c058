use cancerx::{cli, config, error, gateway, host, interactive, logging, scanner};
use cancerx::session::SessionDriver;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use gateway::GeminiGateway;
use std::sync::Arc;

/// 設定からGeminiゲートウェイ付きのドライバを作る
fn build_driver(config: &Config, directive: Option<String>) -> Result<SessionDriver> {
    let gateway = GeminiGateway::from_config(config)?.with_directive(directive);
    Ok(SessionDriver::new(Arc::new(gateway), config.analysis_concurrency()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { paths, recursive, output, directive } => {
            let mut driver = build_driver(&config, directive)?;
            host::run_analyze(&mut driver, &paths, recursive, output.as_deref()).await?;
        }

        Commands::Chat { paths, recursive, directive } => {
            let mut driver = build_driver(&config, directive)?;
            println!("💬 cancerx - 質疑応答\n");

            if !paths.is_empty() {
                let report = scanner::scan_paths(&paths, recursive)?;
                host::intake(&mut driver, report);
            }
            interactive::run_chat(&mut driver, recursive).await?;
        }

        Commands::Config { set_api_key, set_model, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデルを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  APIエンドポイント: {}", config.api_base_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  同時解析数: {}", config.analysis_concurrency());
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
