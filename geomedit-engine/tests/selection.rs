mod common;

use geomedit_core::document::EntityId;
use geomedit_core::geometry::Point3;
use geomedit_engine::camera::{LookAtCamera, ProjectionKind};
use geomedit_engine::commands::{CreateLineCommand, CreatePlaneCommand, CreatePointCommand};
use geomedit_engine::convert;
use geomedit_engine::scene::Scene;
use geomedit_engine::selection::{DEFAULT_PIXEL_THRESHOLD, PickedData, SelectionKind};
use geomedit_engine::tools::point::PointTool;
use glam::{DVec2, DVec3};

fn id(raw: &str) -> EntityId {
    EntityId::from(raw)
}

fn camera(scene: &Scene, kind: ProjectionKind) -> LookAtCamera {
    LookAtCamera::top_down(scene.bounds(), 800.0, 600.0, kind)
}

fn screen_of(camera: &LookAtCamera, world: DVec3) -> DVec2 {
    convert::world_to_screen(camera, world).expect("可投影")
}

fn square_plane(id: &str, half: f64, z: f64) -> CreatePlaneCommand {
    CreatePlaneCommand::new(
        id,
        vec![
            Point3::new(-half, -half, z),
            Point3::new(half, -half, z),
            Point3::new(half, half, z),
            Point3::new(-half, half, z),
        ],
    )
}

#[test]
fn screen_flip_round_trips() {
    let scene = Scene::new();
    let camera = camera(&scene, ProjectionKind::Orthographic);
    let screen = DVec2::new(120.0, 40.0);
    let display = convert::screen_to_display(&camera, screen);
    assert_eq!(display, DVec2::new(120.0, 559.0));
    assert_eq!(convert::display_to_screen(&camera, display), screen);
}

#[test]
fn points_win_over_lines_at_the_same_pixel() {
    let mut scene = Scene::new();
    scene
        .execute(CreatePointCommand::new("a", [0.0, 0.0, 0.0]))
        .expect("创建点");
    scene
        .execute(CreatePointCommand::new("b", [20.0, 0.0, 0.0]))
        .expect("创建点");
    scene
        .execute(CreateLineCommand::between_points("ab", id("a"), id("b")))
        .expect("创建线");
    let camera = camera(&scene, ProjectionKind::Orthographic);

    let picked = scene
        .select_at_screen_position(&camera, screen_of(&camera, DVec3::ZERO), DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Point);
    assert_eq!(picked.id, id("a"));
    assert_eq!(picked.data, PickedData::Point(Point3::new(0.0, 0.0, 0.0)));

    let midpoint = screen_of(&camera, DVec3::new(10.0, 0.0, 0.0));
    let picked = scene
        .select_at_screen_position(&camera, midpoint, DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Line);
    assert_eq!(scene.selection().selected_line(), Some(&id("ab")));
    assert!(scene.selection().selected_point().is_none());
}

#[test]
fn nearer_point_wins_when_stacked() {
    let mut scene = Scene::new();
    scene
        .execute(CreatePointCommand::new("deep", [0.0, 0.0, -30.0]))
        .expect("创建点");
    scene
        .execute(CreatePointCommand::new("shallow", [1.0, 0.0, -5.0]))
        .expect("创建点");
    let camera = camera(&scene, ProjectionKind::Perspective);
    // 点击正落在远处的点上，近处的点偏离几个像素但仍在阈值内
    let click = screen_of(&camera, DVec3::new(0.0, 0.0, -30.0));
    let offset = screen_of(&camera, DVec3::new(1.0, 0.0, -5.0)).distance(click);
    assert!(offset > 0.5 && offset < DEFAULT_PIXEL_THRESHOLD);

    let picked = scene
        .select_at_screen_position(&camera, click, DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert_eq!(picked.id, id("shallow"));
}

#[test]
fn point_wins_over_nearer_line_and_plane() {
    let mut scene = Scene::new();
    scene.execute(square_plane("cover", 10.0, 0.0)).expect("创建面");
    scene
        .execute(CreateLineCommand::new(
            "bar",
            Point3::new(-5.0, 0.0, -10.0).into(),
            Point3::new(5.0, 0.0, -10.0).into(),
        ))
        .expect("创建线");
    scene
        .execute(CreatePointCommand::new("deep", [0.0, 0.0, -20.0]))
        .expect("创建点");
    let camera = camera(&scene, ProjectionKind::Perspective);
    let click = screen_of(&camera, DVec3::new(0.0, 0.0, -20.0));

    let picked = scene
        .select_at_screen_position(&camera, click, DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Point);
    assert_eq!(picked.id, id("deep"));
}

#[test]
fn user_planes_beat_boundary_faces() {
    let mut scene = Scene::new();
    scene.init_boundary_geometry();
    scene
        .execute(square_plane("floor", 20.0, -40.0))
        .expect("创建面");
    let camera = camera(&scene, ProjectionKind::Orthographic);
    let click = screen_of(&camera, DVec3::new(5.0, 5.0, -40.0));

    let picked = scene
        .select_at_screen_position(&camera, click, DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Plane);
    assert_eq!(picked.id, id("floor"));
    assert_eq!(scene.selection().active_plane(), Some(&id("floor")));

    // 用户面之外只剩边界面可选
    let outside = screen_of(&camera, DVec3::new(60.0, 60.0, -40.0));
    let picked = scene
        .select_at_screen_position(&camera, outside, DEFAULT_PIXEL_THRESHOLD)
        .expect("命中边界面");
    assert!(picked.id.as_str().starts_with("boundary_plane_"));
}

#[test]
fn empty_click_clears_selection_and_active_plane() {
    let mut scene = Scene::new();
    scene.execute(square_plane("f", 10.0, 0.0)).expect("创建面");
    let camera = camera(&scene, ProjectionKind::Orthographic);
    scene
        .select_at_screen_position(&camera, screen_of(&camera, DVec3::ZERO), DEFAULT_PIXEL_THRESHOLD)
        .expect("命中");
    assert!(scene.selection().active_plane().is_some());

    let miss = screen_of(&camera, DVec3::new(80.0, -80.0, 0.0));
    assert!(
        scene
            .select_at_screen_position(&camera, miss, DEFAULT_PIXEL_THRESHOLD)
            .is_none()
    );
    assert!(scene.selection().selected().is_none());
    assert!(scene.selection().active_plane().is_none());
}

#[test]
fn world_space_pick_prefers_points() {
    let mut scene = Scene::new();
    scene
        .execute(CreatePointCommand::new("p", [1.0, 1.0, 0.0]))
        .expect("创建点");
    scene.execute(square_plane("f", 10.0, 0.0)).expect("创建面");

    let picked = scene
        .select_at_position(DVec3::new(1.05, 1.0, 0.0), 0.1)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Point);

    let picked = scene
        .select_at_position(DVec3::new(3.0, 3.0, 0.05), 0.1)
        .expect("命中");
    assert_eq!(picked.kind, SelectionKind::Plane);

    // 恰好等于阈值不算命中
    assert!(scene.select_at_position(DVec3::new(3.0, 3.0, 0.1), 0.1).is_none());
}

#[test]
fn point_clicks_resolve_under_the_cursor_even_with_an_active_plane() {
    let mut scene = Scene::new();
    scene.execute(square_plane("f", 30.0, -10.0)).expect("创建面");
    scene.set_active_plane(Some(&id("f"))).expect("激活面");
    let camera = camera(&scene, ProjectionKind::Orthographic);
    let mut tool = PointTool::default();

    // 没有拾取面时落到深度 0（近裁剪面），再被边界限制到 z = 0
    let first_click = screen_of(&camera, DVec3::new(11.0, 7.0, -10.0));
    let raw = PointTool::resolve_click(&camera, first_click).expect("可反投影");
    assert!((raw.x - 11.0).abs() < 1e-6 && (raw.y - 7.0).abs() < 1e-6);

    let first = tool.click(&mut scene, &camera, first_click).expect("创建点");
    let second_click = screen_of(&camera, DVec3::new(-20.0, 15.0, -10.0));
    let second = tool.click(&mut scene, &camera, second_click).expect("创建点");

    let first = scene.document().point(&first).expect("点存在").position;
    let second = scene.document().point(&second).expect("点存在").position;
    assert_eq!(first, Point3::new(11.0, 7.0, 0.0));
    assert_eq!(second, Point3::new(-20.0, 15.0, 0.0));
    assert_ne!(first, second);
}
