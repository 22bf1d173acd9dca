use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use geomedit_config::{AppConfig, ProjectionMode};
use geomedit_core::geometry::WorkspaceBounds;
use geomedit_engine::camera::{LookAtCamera, ProjectionKind};
use geomedit_engine::scene::{DemoEntities, Scene};
use geomedit_engine::selection::SelectionKind;
use geomedit_engine::tools::{SnapSettings, ToolSettings, Toolbox};
use tracing::{debug, info};

use crate::errors::FrontendError;
use crate::renderer::{RenderStats, TracingRenderer};

/// 场景内容来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum SceneSource {
    Script { path: PathBuf, commands: Vec<String> },
    Demo,
}

/// 统一封装构建好的场景、相机、工具与元信息。
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: Scene,
    pub camera: LookAtCamera,
    pub tools: Toolbox,
    pub stats: Rc<RefCell<RenderStats>>,
    pub source: SceneSource,
    pub demo_entities: Option<DemoEntities>,
}

pub fn tool_settings(config: &AppConfig) -> ToolSettings {
    ToolSettings {
        pick_radius_px: config.editor.pick_radius_px,
        world_pick_threshold: config.editor.world_pick_threshold,
        snap: SnapSettings {
            grid: config.snap.grid,
            grid_spacing: config.snap.grid_spacing,
            to_points: config.snap.point,
            to_lines: config.snap.line,
            to_planes: config.snap.plane,
            threshold: config.snap.threshold,
        },
        curve_degree: config.editor.curve_degree,
        curve_samples: config.editor.curve_samples,
    }
}

pub fn camera_for(config: &AppConfig, bounds: &WorkspaceBounds) -> LookAtCamera {
    let kind = match config.viewport.projection {
        ProjectionMode::Perspective => ProjectionKind::Perspective,
        ProjectionMode::Orthographic => ProjectionKind::Orthographic,
    };
    LookAtCamera::framing(
        bounds,
        f64::from(config.viewport.width),
        f64::from(config.viewport.height),
        kind,
    )
}

/// 按配置构建空场景：边界、撤销上限、边界几何与渲染出口。
pub fn prepare_scene(config: &AppConfig) -> LoadedScene {
    let bounds = WorkspaceBounds::from_array(config.workspace.bounds);
    let mut scene = Scene::with_bounds(bounds);
    scene.set_undo_limit(config.editor.undo_limit);
    if config.workspace.boundary_geometry {
        scene.init_boundary_geometry();
    }
    let renderer = TracingRenderer::new();
    let stats = renderer.stats();
    scene.set_renderer(Box::new(renderer));

    let camera = camera_for(config, scene.bounds());
    debug!(bounds = ?bounds.to_array(), "场景已准备");
    LoadedScene {
        scene,
        camera,
        tools: Toolbox::new(tool_settings(config)),
        stats,
        source: SceneSource::Demo,
        demo_entities: None,
    }
}

/// 读取脚本：每行一条命令，保留空行与注释以便报告行号。
pub fn read_script(path: &Path) -> Result<Vec<String>, FrontendError> {
    let content = fs::read_to_string(path).map_err(|source| FrontendError::Script {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(str::to_owned).collect())
}

/// 指定了脚本（命令行优先于配置）时读取脚本，否则构建内置演示。
pub fn load_scene(
    config: &AppConfig,
    script_override: Option<&Path>,
) -> Result<LoadedScene, FrontendError> {
    let mut loaded = prepare_scene(config);
    let script = script_override.or(config.frontend.script.as_deref());

    if let Some(path) = script {
        let commands = read_script(path)?;
        info!(path = %path.display(), lines = commands.len(), "已读取命令脚本");
        loaded.source = SceneSource::Script {
            path: path.to_path_buf(),
            commands,
        };
        return Ok(loaded);
    }

    let demo = loaded.scene.populate_demo()?;
    // 选中演示面并聚焦
    loaded.scene.select(SelectionKind::Plane, &demo.plane)?;
    if let Some(focus) = loaded.scene.focus_point() {
        loaded.camera.focus_on(focus);
    }
    loaded.demo_entities = Some(demo);
    Ok(loaded)
}
