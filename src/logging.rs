//! ログ初期化
//!
//! tracing の出力は stderr に流し、CLIの標準出力（解析結果）と混ざらないようにする。

use crate::error::{CancerXError, Result};
use tracing_subscriber::EnvFilter;

/// グローバルsubscriberを設定
///
/// `RUST_LOG` があればそれを優先。無ければ verbose で debug、通常は warn。
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "cancerx=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CancerXError::Logging(e.to_string()))
}
