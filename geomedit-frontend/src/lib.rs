pub mod cli;
pub mod errors;
pub mod loader;
pub mod renderer;

use std::path::Path;

use errors::FrontendError;
use geomedit_config::AppConfig;
use tracing::info;

/// 加载场景并运行 CLI 前端。脚本中有命令失败时返回首个失败行。
pub fn run_cli(config: &AppConfig, script: Option<&Path>) -> Result<(), FrontendError> {
    info!("启动 CLI 前端");
    let loaded = loader::load_scene(config, script)?;
    let report = cli::run(loaded);
    match report.failures.into_iter().next() {
        Some((line, message)) => Err(FrontendError::Command { line, message }),
        None => Ok(()),
    }
}
