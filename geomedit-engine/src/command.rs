use std::collections::HashMap;

use geomedit_core::document::{EndpointRef, EntityId, EntityKind};
use geomedit_core::geometry::{Point3, Rgb};
use glam::{DVec2, DVec3};
use tracing::debug;

use crate::camera::LookAtCamera;
use crate::commands::{
    CreateCurveCommand, CreateLineCommand, CreatePolylineCommand, MergeDuplicatePointsCommand,
    MovePointCommand, RemoveCurveCommand, RemoveLineCommand, RemovePlaneCommand,
    RemovePointCommand, RemovePolylineCommand, SetColorCommand,
};
use crate::errors::EditError;
use crate::scene::Scene;
use crate::selection::SelectionKind;
use crate::tools::plane::{build_from_lines, build_from_points};
use crate::tools::{ClickOutcome, ToolMode, Toolbox};

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }

    /// 解析一行脚本：空白分隔，第一个词为命令名。空行与 `#` 注释返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut words = line.split_whitespace().map(str::to_owned);
        let name = words.next()?;
        Some(Self {
            name,
            args: words.collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl From<Result<String, String>> for CommandResponse {
    fn from(result: Result<String, String>) -> Self {
        match result {
            Ok(message) => Self::ok(message),
            Err(message) => Self::err(message),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn usage(&self) -> &'static str {
        ""
    }
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut LookAtCamera,
    pub tools: &'a mut Toolbox,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(PointCommand);
        bus.register(LineCommand);
        bus.register(PolylineCommand);
        bus.register(CurveCommand);
        bus.register(PlaneCommand);
        bus.register(MoveCommand);
        bus.register(RemoveCommand);
        bus.register(MergeCommand);
        bus.register(ColorCommand);
        bus.register(SelectCommand);
        bus.register(PickCommand);
        bus.register(LocateCommand);
        bus.register(HighlightCommand);
        bus.register(ModeCommand);
        bus.register(ClickCommand);
        bus.register(FinishCommand);
        bus.register(BoundaryCommand);
        bus.register(FocusSelectionCommand);
        bus.register(ClearSelectionCommand);
        bus.register(UndoCommand);
        bus.register(RedoCommand);
        bus.register(ListCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            let response = handler.execute(request, context);
            debug!(
                command = %request.name,
                success = response.success,
                message = response.message.as_deref().unwrap_or(""),
                "命令已处理"
            );
            response
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    pub fn usage(&self, name: &str) -> Option<&'static str> {
        self.handlers.get(name).map(|handler| handler.usage())
    }
}

// ---- 参数解析 ----

fn arg<'r>(request: &'r CommandRequest, index: usize) -> Result<&'r str, String> {
    request
        .args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("{} 缺少第 {} 个参数", request.name, index + 1))
}

fn number(request: &CommandRequest, index: usize) -> Result<f64, String> {
    let raw = arg(request, index)?;
    raw.parse::<f64>()
        .map_err(|_| format!("无法解析数值: {raw}"))
}

fn vec3(request: &CommandRequest, start: usize) -> Result<DVec3, String> {
    Ok(DVec3::new(
        number(request, start)?,
        number(request, start + 1)?,
        number(request, start + 2)?,
    ))
}

fn screen(request: &CommandRequest) -> Result<DVec2, String> {
    Ok(DVec2::new(number(request, 0)?, number(request, 1)?))
}

fn entity_kind(request: &CommandRequest, index: usize) -> Result<EntityKind, String> {
    let raw = arg(request, index)?;
    EntityKind::parse(raw).ok_or_else(|| format!("未知实体类别: {raw}"))
}

fn ids_from(request: &CommandRequest, start: usize) -> Vec<EntityId> {
    request.args.iter().skip(start).map(|id| EntityId::from(id.as_str())).collect()
}

fn edit_failed(err: EditError) -> String {
    err.to_string()
}

fn describe_outcome(outcome: &ClickOutcome) -> String {
    match outcome {
        ClickOutcome::Ignored => "点击未命中".to_owned(),
        ClickOutcome::Selected(picked) => format!("已选中 {}", picked.id),
        ClickOutcome::Pending { count } => format!("已记录 {count} 个输入"),
        ClickOutcome::Created { kind, id } => format!("已创建 {kind} {id}"),
        ClickOutcome::Reset => "输入已清空".to_owned(),
    }
}

// ---- 创建 ----

struct PointCommand;

impl CommandHandler for PointCommand {
    fn name(&self) -> &'static str {
        "point"
    }

    fn usage(&self) -> &'static str {
        "point <x> <y> <z> [name]"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let world = vec3(request, 0)?;
            let name = request.args.get(3).map(String::as_str);
            let id = context
                .tools
                .point
                .create_point_at_position(context.scene, world, name)
                .map_err(edit_failed)?;
            Ok(format!("已创建点 {id}"))
        };
        run().into()
    }
}

struct LineCommand;

impl CommandHandler for LineCommand {
    fn name(&self) -> &'static str {
        "line"
    }

    fn usage(&self) -> &'static str {
        "line <point> <point> | line <x1> <y1> <z1> <x2> <y2> <z2>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let (start, end) = match request.args.len() {
                2 => (
                    EndpointRef::PointId(arg(request, 0)?.into()),
                    EndpointRef::PointId(arg(request, 1)?.into()),
                ),
                6 => (
                    EndpointRef::Coordinate(Point3::from_vec(vec3(request, 0)?)),
                    EndpointRef::Coordinate(Point3::from_vec(vec3(request, 3)?)),
                ),
                _ => return Err("line 需要两个点 id 或六个坐标".to_owned()),
            };
            let id = context.scene.document().next_id(EntityKind::Line);
            context
                .scene
                .execute(CreateLineCommand::new(id.clone(), start, end))
                .map_err(edit_failed)?;
            Ok(format!("已创建线 {id}"))
        };
        run().into()
    }
}

struct PolylineCommand;

impl CommandHandler for PolylineCommand {
    fn name(&self) -> &'static str {
        "polyline"
    }

    fn usage(&self) -> &'static str {
        "polyline <point> <point> ..."
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let id = context.scene.document().next_id(EntityKind::Polyline);
        let command = CreatePolylineCommand::new(id.clone(), ids_from(request, 0));
        match context.scene.execute(command) {
            Ok(()) => CommandResponse::ok(format!("已创建折线 {id}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct CurveCommand;

impl CommandHandler for CurveCommand {
    fn name(&self) -> &'static str {
        "curve"
    }

    fn usage(&self) -> &'static str {
        "curve <point> <point> <point> ..."
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let settings = *context.tools.settings();
        let id = context.scene.document().next_id(EntityKind::Curve);
        let command = CreateCurveCommand::new(
            id.clone(),
            ids_from(request, 0),
            settings.curve_degree,
            settings.curve_samples,
        );
        match context.scene.execute(command) {
            Ok(()) => CommandResponse::ok(format!("已创建曲线 {id}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct PlaneCommand;

impl CommandHandler for PlaneCommand {
    fn name(&self) -> &'static str {
        "plane"
    }

    fn usage(&self) -> &'static str {
        "plane lines <line>... | plane points <point>..."
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let ids = ids_from(request, 1);
            let document = context.scene.document();
            let polygon = match arg(request, 0)? {
                "lines" => build_from_lines(document, &ids),
                "points" => build_from_points(document, &ids),
                other => return Err(format!("未知的面构建方式: {other}")),
            }
            .map_err(edit_failed)?;
            let id = document.next_id(EntityKind::Plane);
            context
                .scene
                .execute(polygon.into_command(id.clone()))
                .map_err(edit_failed)?;
            Ok(format!("已创建面 {id}"))
        };
        run().into()
    }
}

// ---- 修改 ----

struct MoveCommand;

impl CommandHandler for MoveCommand {
    fn name(&self) -> &'static str {
        "move"
    }

    fn usage(&self) -> &'static str {
        "move <point> <x> <y> <z>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let id = arg(request, 0)?;
            let target = vec3(request, 1)?;
            context
                .scene
                .execute(MovePointCommand::to(id, target))
                .map_err(edit_failed)?;
            Ok(format!("已移动点 {id}"))
        };
        run().into()
    }
}

struct RemoveCommand;

impl CommandHandler for RemoveCommand {
    fn name(&self) -> &'static str {
        "remove"
    }

    fn usage(&self) -> &'static str {
        "remove <kind> <id>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let kind = entity_kind(request, 0)?;
            let id = arg(request, 1)?;
            let scene = &mut *context.scene;
            match kind {
                EntityKind::Point => scene.execute(RemovePointCommand::new(id)),
                EntityKind::Line => scene.execute(RemoveLineCommand::new(id)),
                EntityKind::Polyline => scene.execute(RemovePolylineCommand::new(id)),
                EntityKind::Curve => scene.execute(RemoveCurveCommand::new(id)),
                EntityKind::Plane => scene.execute(RemovePlaneCommand::new(id)),
            }
            .map_err(edit_failed)?;
            Ok(format!("已删除 {kind} {id}"))
        };
        run().into()
    }
}

struct MergeCommand;

impl CommandHandler for MergeCommand {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn usage(&self) -> &'static str {
        "merge [threshold]"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let threshold = if request.args.is_empty() {
                MergeDuplicatePointsCommand::DEFAULT_THRESHOLD
            } else {
                number(request, 0)?
            };
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(format!("合并阈值必须为正数: {threshold}"));
            }
            let merged = context
                .tools
                .point
                .merge_duplicate_points(context.scene, threshold)
                .map_err(edit_failed)?;
            Ok(format!("已合并 {merged} 个重复点"))
        };
        run().into()
    }
}

struct ColorCommand;

impl CommandHandler for ColorCommand {
    fn name(&self) -> &'static str {
        "color"
    }

    fn usage(&self) -> &'static str {
        "color <kind> <id> <r> <g> <b>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let kind = entity_kind(request, 0)?;
            let id = arg(request, 1)?;
            let rgb = vec3(request, 2)?;
            context
                .scene
                .execute(SetColorCommand::new(kind, id, Rgb::new(rgb.x, rgb.y, rgb.z)))
                .map_err(edit_failed)?;
            Ok(format!("已修改 {kind} {id} 的颜色"))
        };
        run().into()
    }
}

// ---- 选择与工具 ----

struct SelectCommand;

impl CommandHandler for SelectCommand {
    fn name(&self) -> &'static str {
        "select"
    }

    fn usage(&self) -> &'static str {
        "select <point|line|plane> <id>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let kind = entity_kind(request, 0)?;
            let selection_kind = SelectionKind::from_entity_kind(kind)
                .ok_or_else(|| format!("{kind} 不可选中"))?;
            let id = EntityId::from(arg(request, 1)?);
            context
                .scene
                .select(selection_kind, &id)
                .map_err(edit_failed)?;
            Ok(format!("已选中 {kind} {id}"))
        };
        run().into()
    }
}

struct PickCommand;

impl CommandHandler for PickCommand {
    fn name(&self) -> &'static str {
        "pick"
    }

    fn usage(&self) -> &'static str {
        "pick <screen_x> <screen_y>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let position = match screen(request) {
            Ok(position) => position,
            Err(message) => return CommandResponse::err(message),
        };
        let radius = context.tools.settings().pick_radius_px;
        match context
            .scene
            .select_at_screen_position(&*context.camera, position, radius)
        {
            Some(picked) => CommandResponse::ok(format!(
                "已选中 {} {}",
                picked.kind.entity_kind(),
                picked.id
            )),
            None => CommandResponse::ok("未拾取到实体，选中集已清空"),
        }
    }
}

struct LocateCommand;

impl CommandHandler for LocateCommand {
    fn name(&self) -> &'static str {
        "locate"
    }

    fn usage(&self) -> &'static str {
        "locate <x> <y> <z>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let world = match vec3(request, 0) {
            Ok(world) => world,
            Err(message) => return CommandResponse::err(message),
        };
        let threshold = context.tools.settings().world_pick_threshold;
        match context.scene.select_at_position(world, threshold) {
            Some(picked) => CommandResponse::ok(format!(
                "已选中 {} {}",
                picked.kind.entity_kind(),
                picked.id
            )),
            None => CommandResponse::ok("附近没有实体，选中集已清空"),
        }
    }
}

struct HighlightCommand;

impl CommandHandler for HighlightCommand {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn usage(&self) -> &'static str {
        "highlight <kind> <id> | highlight off"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if request.args.first().map(String::as_str) == Some("off") {
            context.scene.clear_highlight();
            return CommandResponse::ok("高亮已清除");
        }
        let mut run = || -> Result<String, String> {
            let kind = entity_kind(request, 0)?;
            let id = EntityId::from(arg(request, 1)?);
            context
                .scene
                .switch_highlight(kind, &id, Rgb::YELLOW)
                .map_err(edit_failed)?;
            Ok(format!("已高亮 {kind} {id}"))
        };
        run().into()
    }
}

struct ModeCommand;

impl CommandHandler for ModeCommand {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn usage(&self) -> &'static str {
        "mode <select|point|line|polyline|curve|plane>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let raw = arg(request, 0)?;
            let mode = ToolMode::parse(raw).ok_or_else(|| format!("未知工具: {raw}"))?;
            context.tools.set_mode(mode);
            Ok(format!("当前工具: {}", mode.label()))
        };
        run().into()
    }
}

struct ClickCommand;

impl CommandHandler for ClickCommand {
    fn name(&self) -> &'static str {
        "click"
    }

    fn usage(&self) -> &'static str {
        "click <screen_x> <screen_y>"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let mut run = || -> Result<String, String> {
            let position = screen(request)?;
            let outcome = context
                .tools
                .click(context.scene, &*context.camera, position)
                .map_err(edit_failed)?;
            Ok(describe_outcome(&outcome))
        };
        run().into()
    }
}

struct FinishCommand;

impl CommandHandler for FinishCommand {
    fn name(&self) -> &'static str {
        "finish"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.tools.finish(context.scene) {
            Ok(outcome) => CommandResponse::ok(describe_outcome(&outcome)),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct BoundaryCommand;

impl CommandHandler for BoundaryCommand {
    fn name(&self) -> &'static str {
        "boundary"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let created = context.scene.init_boundary_geometry();
        CommandResponse::ok(format!("边界几何已就绪，新增 {created} 个实体"))
    }
}

struct FocusSelectionCommand;

impl CommandHandler for FocusSelectionCommand {
    fn name(&self) -> &'static str {
        "focus_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        match context.scene.focus_point() {
            Some(focus) => {
                context.camera.focus_on(focus);
                CommandResponse::ok("视口已聚焦当前选中实体")
            }
            None => CommandResponse::err("当前没有选中实体"),
        }
    }
}

struct ClearSelectionCommand;

impl CommandHandler for ClearSelectionCommand {
    fn name(&self) -> &'static str {
        "clear_selection"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        context.scene.clear_selection();
        CommandResponse::ok("选中集已清空")
    }
}

// ---- 历史 ----

struct UndoCommand;

impl CommandHandler for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let description = context.scene.history().undo_description();
        match context.scene.undo() {
            Ok(()) => CommandResponse::ok(format!(
                "已撤销: {}",
                description.unwrap_or_default()
            )),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct RedoCommand;

impl CommandHandler for RedoCommand {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let description = context.scene.history().redo_description();
        match context.scene.redo() {
            Ok(()) => CommandResponse::ok(format!(
                "已重做: {}",
                description.unwrap_or_default()
            )),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

struct ListCommand;

impl CommandHandler for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn usage(&self) -> &'static str {
        "list [kind]"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let document = context.scene.document();
        let Some(raw) = request.args.first() else {
            let summary = context.scene.summary();
            return CommandResponse::ok(format!(
                "点 {} / 线 {} / 折线 {} / 曲线 {} / 面 {} / 可撤销 {} / 可重做 {}",
                summary.points,
                summary.lines,
                summary.polylines,
                summary.curves,
                summary.planes,
                summary.undo_depth,
                summary.redo_depth
            ));
        };
        let Some(kind) = EntityKind::parse(raw) else {
            return CommandResponse::err(format!("未知实体类别: {raw}"));
        };
        let ids: Vec<String> = match kind {
            EntityKind::Point => document.points().map(|p| p.id.to_string()).collect(),
            EntityKind::Line => document.lines().map(|l| l.id.to_string()).collect(),
            EntityKind::Polyline => document.polylines().map(|p| p.id.to_string()).collect(),
            EntityKind::Curve => document.curves().map(|c| c.id.to_string()).collect(),
            EntityKind::Plane => document.planes().map(|p| p.id.to_string()).collect(),
        };
        CommandResponse::ok(format!("{kind}: {}", ids.join(", ")))
    }
}
