use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指定配置文件路径的环境变量。
pub const CONFIG_ENV_VAR: &str = "GEOMEDIT_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub snap: SnapConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `GEOMEDIT_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let dir = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(&dir)
    }

    /// 在给定目录下寻找 `config/default.toml`，缺失时返回默认配置。
    pub fn discover_in(dir: &Path) -> Result<Self, ConfigError> {
        let default_path = dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 工作空间范围：`[xmin, xmax, ymin, ymax, zmin, zmax]`。
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "WorkspaceConfig::default_bounds")]
    pub bounds: [f64; 6],
    #[serde(default = "default_true")]
    pub boundary_geometry: bool,
}

impl WorkspaceConfig {
    fn default_bounds() -> [f64; 6] {
        [-100.0, 100.0, -100.0, 100.0, -50.0, 0.0]
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            bounds: Self::default_bounds(),
            boundary_geometry: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "EditorConfig::default_undo_limit")]
    pub undo_limit: usize,
    #[serde(default = "EditorConfig::default_pick_radius")]
    pub pick_radius_px: f64,
    #[serde(default = "EditorConfig::default_world_threshold")]
    pub world_pick_threshold: f64,
    #[serde(default = "EditorConfig::default_curve_degree")]
    pub curve_degree: usize,
    #[serde(default = "EditorConfig::default_curve_samples")]
    pub curve_samples: usize,
}

impl EditorConfig {
    fn default_undo_limit() -> usize {
        100
    }

    fn default_pick_radius() -> f64 {
        10.0
    }

    fn default_world_threshold() -> f64 {
        0.1
    }

    fn default_curve_degree() -> usize {
        3
    }

    fn default_curve_samples() -> usize {
        100
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_limit: Self::default_undo_limit(),
            pick_radius_px: Self::default_pick_radius(),
            world_pick_threshold: Self::default_world_threshold(),
            curve_degree: Self::default_curve_degree(),
            curve_samples: Self::default_curve_samples(),
        }
    }
}

/// 吸附开关。默认只关闭网格吸附。
#[derive(Debug, Clone, Deserialize)]
pub struct SnapConfig {
    #[serde(default)]
    pub grid: bool,
    #[serde(default = "SnapConfig::default_grid_spacing")]
    pub grid_spacing: f64,
    #[serde(default = "default_true")]
    pub point: bool,
    #[serde(default = "default_true")]
    pub line: bool,
    #[serde(default = "default_true")]
    pub plane: bool,
    #[serde(default = "SnapConfig::default_threshold")]
    pub threshold: f64,
}

impl SnapConfig {
    fn default_grid_spacing() -> f64 {
        10.0
    }

    fn default_threshold() -> f64 {
        0.1
    }
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            grid: false,
            grid_spacing: Self::default_grid_spacing(),
            point: true,
            line: true,
            plane: true,
            threshold: Self::default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: u32,
    #[serde(default)]
    pub projection: ProjectionMode,
}

impl ViewportConfig {
    fn default_width() -> u32 {
        800
    }

    fn default_height() -> u32 {
        600
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
            projection: ProjectionMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    /// 启动时执行的命令脚本；缺省时运行内置演示。
    #[serde(default)]
    pub script: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
