use geomedit_engine::command::{CommandBus, CommandContext, CommandRequest};
use tracing::{info, warn};

use crate::loader::{LoadedScene, SceneSource};
use crate::renderer::Primitive;

/// 脚本执行结果：成功条数与失败行（行号从 1 开始）。
#[derive(Debug, Clone, Default)]
pub struct ScriptReport {
    pub executed: usize,
    pub failures: Vec<(usize, String)>,
}

/// 逐行执行命令脚本。单行失败只记录，不中断后续命令。
pub fn run_script(
    bus: &CommandBus,
    context: &mut CommandContext<'_>,
    lines: &[String],
) -> ScriptReport {
    let mut report = ScriptReport::default();
    for (index, line) in lines.iter().enumerate() {
        let Some(request) = CommandRequest::parse(line) else {
            continue;
        };
        match dispatch_cli_command(bus, &request, context) {
            Ok(()) => report.executed += 1,
            Err(message) => {
                warn!(line = index + 1, command = %request.name, "脚本命令失败: {message}");
                report.failures.push((index + 1, message));
            }
        }
    }
    report
}

fn dispatch_cli_command(
    bus: &CommandBus,
    request: &CommandRequest,
    context: &mut CommandContext<'_>,
) -> Result<(), String> {
    let response = bus.dispatch(request, context);
    if response.success {
        if let Some(message) = response.message {
            println!("[命令] {message}");
        }
        Ok(())
    } else {
        Err(response.message.unwrap_or_else(|| "未知错误".to_string()))
    }
}

/// 运行已加载的场景：脚本来源逐行执行，演示来源直接输出概览。
pub fn run(loaded: LoadedScene) -> ScriptReport {
    let LoadedScene {
        mut scene,
        mut camera,
        mut tools,
        stats,
        source,
        demo_entities,
    } = loaded;
    let bus = CommandBus::new();
    let mut context = CommandContext {
        scene: &mut scene,
        camera: &mut camera,
        tools: &mut tools,
    };

    let report = match &source {
        SceneSource::Script { path, commands } => {
            println!("执行命令脚本：{}", path.display());
            run_script(&bus, &mut context, commands)
        }
        SceneSource::Demo => {
            if let Some(demo) = &demo_entities {
                let points: Vec<String> = demo.points.iter().map(ToString::to_string).collect();
                let lines: Vec<String> = demo.lines.iter().map(ToString::to_string).collect();
                println!("已构建内置示例：");
                println!("  - 点 {}", points.join(", "));
                println!("  - 线 {}", lines.join(", "));
                println!("  - 面 {}", demo.plane);
            }
            ScriptReport::default()
        }
    };

    let mut commands: Vec<&str> = bus.available_commands().copied().collect();
    commands.sort_unstable();
    println!("支持的命令: {}", commands.join(", "));

    let summary = scene.summary();
    info!(
        points = summary.points,
        lines = summary.lines,
        polylines = summary.polylines,
        curves = summary.curves,
        planes = summary.planes,
        "场景统计"
    );
    println!(
        "场景：点 {} / 线 {} / 折线 {} / 曲线 {} / 面 {}",
        summary.points, summary.lines, summary.polylines, summary.curves, summary.planes
    );
    println!(
        "历史：可撤销 {} / 可重做 {}",
        summary.undo_depth, summary.redo_depth
    );
    if let Some(description) = scene.history().undo_description() {
        println!("最近一次操作：{description}");
    }
    match scene.selection().selected() {
        Some((kind, id)) => println!("当前选中：{} {}", kind.entity_kind(), id),
        None => println!("当前尚未选中任何实体。"),
    }
    let target = camera.target();
    println!(
        "视口目标=({:.2}, {:.2}, {:.2})",
        target.x, target.y, target.z
    );

    let stats = stats.borrow();
    println!(
        "渲染：{} 次输出 / {} 次移除，可见点 {} / 线 {} / 折线 {} / 面 {}",
        stats.rendered,
        stats.removed,
        stats.visible_count(Primitive::Point),
        stats.visible_count(Primitive::Line),
        stats.visible_count(Primitive::Polyline),
        stats.visible_count(Primitive::Polygon)
    );
    for (line, message) in &report.failures {
        println!("  第 {line} 行失败：{message}");
    }
    report
}

#[cfg(test)]
mod tests {
    use geomedit_config::AppConfig;

    use super::*;
    use crate::loader::prepare_scene;

    fn script(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| (*line).to_owned()).collect()
    }

    #[test]
    fn script_failures_are_collected_per_line() {
        let mut loaded = prepare_scene(&AppConfig::default());
        let bus = CommandBus::new();
        let mut context = CommandContext {
            scene: &mut loaded.scene,
            camera: &mut loaded.camera,
            tools: &mut loaded.tools,
        };
        let report = run_script(
            &bus,
            &mut context,
            &script(&[
                "point 0 0 0",
                "",
                "# 注释",
                "point 10 0 0",
                "line point_0 point_1",
                "line point_0 point_0",
                "bogus",
            ]),
        );
        assert_eq!(report.executed, 3);
        let failed: Vec<usize> = report.failures.iter().map(|(line, _)| *line).collect();
        assert_eq!(failed, vec![6, 7]);
        assert_eq!(loaded.scene.summary().lines, 1);
    }

    #[test]
    fn script_run_reports_through_loaded_scene() {
        let mut loaded = prepare_scene(&AppConfig::default());
        loaded.source = SceneSource::Script {
            path: "inline".into(),
            commands: script(&["point 1 1 0", "point 2 2 0", "undo"]),
        };
        let report = run(loaded);
        assert_eq!(report.executed, 3);
        assert!(report.failures.is_empty());
    }
}
