use std::path::PathBuf;

use geomedit_config::{AppConfig, ConfigError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 命令行参数。
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let slot = match arg.as_str() {
                "--config" => &mut parsed.config,
                "--script" => &mut parsed.script,
                other => return Err(format!("未知参数：{other}")),
            };
            let path = args
                .next()
                .ok_or_else(|| format!("`{arg}` 需要提供文件路径"))?;
            *slot = Some(PathBuf::from(path));
        }
        Ok(parsed)
    }
}

fn main() {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("用法: geomedit-app [--config <path>] [--script <path>]");
            std::process::exit(1);
        }
    };

    let config = load_configuration(args.config);
    init_logging(&config.logging.level);
    info!("启动 geomedit 几何编辑器");
    debug!(?config, "生效配置");

    if let Err(err) = geomedit_frontend::run_cli(&config, args.script.as_deref()) {
        error!(error = %err, "CLI 前端运行失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    let loaded = match &override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    loaded.unwrap_or_else(|err| {
        // 日志尚未初始化，失败原因直接写到 stderr
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                eprintln!("加载配置 {} 失败，使用内建默认值：{err}", path.display());
            }
            ConfigError::Context { .. } => eprintln!("加载配置失败，使用内建默认值：{err}"),
        }
        AppConfig::default()
    })
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| {
        eprintln!("无效的日志过滤器 `{level}`，回退到 info");
        EnvFilter::new("info")
    });
    if fmt().with_env_filter(filter).try_init().is_err() {
        warn!("日志系统已初始化，忽略重复初始化");
    }
}
