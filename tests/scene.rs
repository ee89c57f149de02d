use std::sync::{Arc, Mutex};
use std::time::Duration;

use memory_galaxy::node_state::{Emphasis, accent_color};
use memory_galaxy::{
    GalaxyConfig, GalaxyScene, Item, MediaKind, Placement, RngSource, SceneEvent, ScriptedSource,
};

fn config() -> GalaxyConfig {
    let mut config = GalaxyConfig::default();
    config.backdrop.star_count = 0;
    config.orbit.auto_rotate = false;
    config
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn close(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
}

fn settle(scene: &mut GalaxyScene) {
    for _ in 0..1000 {
        if !scene.camera_mut().update_animation() {
            break;
        }
    }
}

fn hinted_items(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            Item::new(format!("/photos/{i}.jpg"), MediaKind::Image).with_hint(
                i as f32,
                (i % 7) as f32,
                -(i as f32) / 2.0,
            )
        })
        .collect()
}

#[test]
fn three_item_dataset_end_to_end() {
    let selected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&selected);
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(11), move |item: &Item| {
        sink.lock().unwrap().push(item.clone())
    });

    scene.load(vec![
        Item::new("/a.jpg", MediaKind::Image).with_hint(1.0, 2.0, 3.0),
        Item::new("/b.mp3", MediaKind::Audio).with_hint(4.0, 5.0, 6.0),
        Item::new("/c.jpg", MediaKind::Image),
    ]);

    let nodes = scene.nodes();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].coordinate, [1.0, 2.0, 3.0]);
    assert_eq!(nodes[1].coordinate, [4.0, 5.0, 6.0]);
    assert_eq!(nodes[2].placement, Placement::Fallback);
    assert!(nodes[2].coordinate.iter().all(|c| (-5.0..=5.0).contains(c)));

    let c = nodes[2].coordinate;
    let center = [
        (5.0 + c[0]) / 3.0,
        (7.0 + c[1]) / 3.0,
        (9.0 + c[2]) / 3.0,
    ];
    let pose = scene.camera().pose();
    assert!(close(pose.target, center));
    assert!(close(pose.position, [center[0], center[1], center[2] + 18.0]));

    assert!(scene.click("/c.jpg"));
    let selected = selected.lock().unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].path, "/c.jpg");
}

#[test]
fn camera_frames_once_per_dataset() {
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(2), |_| {});

    scene.load(Vec::new());
    assert!(scene.drain_events().is_empty());

    let items = hinted_items(50);
    scene.load(items.clone());
    let framed = scene.camera().pose();
    assert!(matches!(
        scene.drain_events().as_slice(),
        [SceneEvent::CameraFramed { .. }]
    ));

    // The user takes over
    scene.camera_mut().zoom(0.5);
    scene.camera_mut().pan(40.0, -25.0);
    settle(&mut scene);
    let user_pose = scene.camera().pose();
    let user_distance = scene.camera().distance;
    assert!(!close(user_pose.target, framed.target));
    assert!((user_distance - 9.0).abs() < 0.01);

    scene.load(items.clone());
    scene.frame(ms(16));
    assert!(close(scene.camera().pose().target, user_pose.target));
    assert!((scene.camera().distance - user_distance).abs() < 1e-3);
    assert!(scene.drain_events().is_empty());

    // Clearing the dataset re-arms the guard
    scene.load(Vec::new());
    scene.load(items);
    assert!(close(scene.camera().pose().target, framed.target));
    assert_eq!(scene.camera().distance, 18.0);
}

#[test]
fn per_kind_caps_bound_node_count() {
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(3), |_| {});
    let images: Vec<Item> = (0..1000)
        .map(|i| Item::new(format!("img{i}"), MediaKind::Image))
        .collect();
    scene.load(images.clone());
    assert_eq!(scene.nodes().len(), 600);
    assert_eq!(scene.nodes()[599].id(), "img599");

    let mut mixed = images;
    mixed.extend((0..300).map(|i| Item::new(format!("snd{i}"), MediaKind::Audio)));
    scene.load(mixed);
    let audio = scene
        .nodes()
        .iter()
        .filter(|n| n.item.kind == MediaKind::Audio)
        .count();
    assert_eq!(audio, 200);
    assert_eq!(scene.nodes().len(), 800);
}

#[test]
fn dreaming_rate_matches_threshold() {
    let mut config = config();
    config.attention.threshold = 0.95;
    let mut scene = GalaxyScene::mount(config, RngSource::seeded(42), |_| {});
    scene.load(hinted_items(100));
    scene.drain_events();

    let polls = 200u64;
    for k in 1..=polls {
        scene.attention_tick(ms(6000 * k));
    }
    let started = scene
        .drain_events()
        .iter()
        .filter(|e| matches!(e, SceneEvent::AttentionStarted { .. }))
        .count();

    // Dwell is shorter than the interval, so every node draws on every poll
    let rate = started as f64 / (polls * 100) as f64;
    assert!((rate - 0.05).abs() < 0.01, "observed rate {rate}");
}

#[test]
fn hover_takes_precedence_over_dreaming() {
    let mut config = config();
    config.attention.threshold = 0.5;
    let mut scene = GalaxyScene::mount(config, ScriptedSource::constant(0.9), |_| {});
    scene.load(vec![
        Item::new("img", MediaKind::Image).with_hint(0.0, 0.0, 0.0),
        Item::new("snd", MediaKind::Audio).with_hint(2.0, 0.0, 0.0),
    ]);

    scene.attention_tick(ms(6000));
    scene.pointer_enter("img");
    let visuals = scene.frame(ms(6016)).to_vec();

    assert_eq!(visuals[0].emphasis, Emphasis::Hover);
    assert_eq!(visuals[0].accent, accent_color(MediaKind::Image, Emphasis::Hover));
    assert_eq!(visuals[1].emphasis, Emphasis::Attention);
    assert_eq!(
        visuals[1].accent,
        accent_color(MediaKind::Audio, Emphasis::Attention)
    );
    assert!(visuals.iter().all(|v| v.glow_ring));
    assert_eq!(scene.popovers().len(), 2);
}

#[test]
fn fallback_positions_survive_reloads() {
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(9), |_| {});
    let items = vec![
        Item::new("x", MediaKind::Image),
        Item::new("y", MediaKind::Audio),
    ];
    scene.load(items.clone());
    let first: Vec<[f32; 3]> = scene.nodes().iter().map(|n| n.coordinate).collect();

    for t in 1..20 {
        scene.frame(ms(t * 16));
    }
    let mut grown = items;
    grown.push(Item::new("z", MediaKind::Video));
    scene.load(grown);

    assert_eq!(scene.node("x").unwrap().coordinate, first[0]);
    assert_eq!(scene.node("y").unwrap().coordinate, first[1]);
    assert_eq!(scene.node("z").unwrap().placement, Placement::Fallback);
}

#[test]
fn zero_coordinates_are_valid_hints() {
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(1), |_| {});
    scene.load(vec![Item::new("origin", MediaKind::Image).with_hint(0.0, 0.0, 0.0)]);
    let node = scene.node("origin").unwrap();
    assert_eq!(node.placement, Placement::Hinted);
    assert_eq!(node.coordinate, [0.0, 0.0, 0.0]);
}

#[test]
fn breathing_follows_scene_time() {
    let mut config = config();
    config.breathing.smoothing = 1.0;
    let mut scene = GalaxyScene::mount(config, RngSource::seeded(1), |_| {});
    scene.load(vec![Item::new("n", MediaKind::Image).with_hint(0.5, 0.0, 0.0)]);

    let t = 2.0f32;
    let visual = scene.frame(Duration::from_secs_f32(t))[0].clone();
    let expected = 1.0 + (t * 1.5 + 0.5).sin() * 0.15;
    assert!((visual.transform.scale - expected).abs() < 1e-4);
    assert_eq!(visual.transform.position, [0.5, 0.0, 0.0]);

    // Facing points at the camera
    let facing = visual.transform.facing();
    let camera = scene.camera().position;
    let to_camera = [camera[0] - 0.5, camera[1], camera[2]];
    let len = (to_camera.iter().map(|c| c * c).sum::<f32>()).sqrt();
    for i in 0..3 {
        assert!((facing[i] - to_camera[i] / len).abs() < 1e-4);
    }
}

#[test]
fn teardown_is_final() {
    let calls = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&calls);
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(1), move |_| {
        *sink.lock().unwrap() += 1
    });
    scene.load(hinted_items(5));
    scene.teardown();
    scene.teardown();

    assert!(!scene.click("/photos/0.jpg"));
    scene.attention_tick(ms(600_000));
    assert!(scene.frame(ms(600_000)).is_empty());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn repeated_ids_address_the_first_node() {
    let mut scene = GalaxyScene::mount(config(), RngSource::seeded(1), |_| {});
    scene.load(vec![
        Item::new("dup", MediaKind::Image).with_hint(1.0, 0.0, 0.0),
        Item::new("dup", MediaKind::Audio).with_hint(2.0, 0.0, 0.0),
    ]);
    assert_eq!(scene.nodes().len(), 1);
    assert_eq!(scene.node("dup").unwrap().coordinate, [1.0, 0.0, 0.0]);

    scene.pointer_enter("dup");
    assert!(scene.state("dup").unwrap().hovered);
    assert_eq!(scene.popovers().len(), 1);
}
