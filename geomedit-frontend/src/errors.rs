use std::path::PathBuf;

use geomedit_engine::EditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("读取命令脚本 {path:?} 失败: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("脚本第 {line} 行执行失败: {message}")]
    Command { line: usize, message: String },
    #[error("构建演示场景失败: {0}")]
    Demo(#[from] EditError),
}
