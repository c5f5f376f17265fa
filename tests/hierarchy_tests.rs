//! Integration tests for model hierarchy mutation and transform evaluation.

use fbx::prelude::*;
use fbx::util::matrix_approx_eq;

const EPS: f64 = 1e-9;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn test_translation_only_global_transform() {
    init_tracing();
    let mut scene = Scene::new();
    let node = scene.create_model("node", ObjectType::Null).expect("Failed to create model");
    scene
        .get_mut::<Model>(node)
        .expect("Model should exist")
        .set_local_translation(Some(DVec3::new(1.0, 0.0, 0.0)));

    let world = scene.global_transform(node).expect("Failed to evaluate transform");
    assert!(matrix_approx_eq(&world, &DMat4::from_translation(DVec3::X), EPS));
}

#[test]
fn test_add_child_twice_keeps_single_entry() {
    init_tracing();
    let mut scene = Scene::new();
    let a = scene.create_model("a", ObjectType::Null).unwrap();
    let b = scene.create_model("b", ObjectType::Null).unwrap();
    let c = scene.create_model("c", ObjectType::Null).unwrap();

    scene.add_child(a, b).unwrap();
    scene.add_child(a, c).unwrap();
    scene.add_child(a, b).unwrap();

    // Membership unchanged, b moved to the end.
    assert_eq!(scene.children(a), &[c, b]);
    assert_eq!(scene.parent(b), Some(a));
}

#[test]
fn test_self_parent_leaves_children_untouched() {
    let mut scene = Scene::new();
    let a = scene.create_model("a", ObjectType::Null).unwrap();
    let b = scene.create_model("b", ObjectType::Null).unwrap();
    scene.add_child(a, b).unwrap();

    assert_eq!(scene.add_child(a, a), Err(Error::SelfReference));
    assert_eq!(scene.children(a), &[b]);
}

#[test]
fn test_detach_clears_both_sides() {
    let mut scene = Scene::new();
    let root = scene.create_model("root", ObjectType::Null).unwrap();
    let kids: Vec<ObjectHandle> = (0..3)
        .map(|i| scene.create_model(format!("kid{i}"), ObjectType::LimbNode).unwrap())
        .collect();
    for &kid in &kids {
        scene.add_child(root, kid).unwrap();
    }

    scene.detach_from_parent(kids[1]).unwrap();
    assert_eq!(scene.children(root), &[kids[0], kids[2]]);
    assert_eq!(scene.parent(kids[1]), None);

    scene.detach_all_children(root).unwrap();
    assert!(scene.children(root).is_empty());
    assert!(kids.iter().all(|&k| scene.parent(k).is_none()));
}

#[test]
fn test_rotated_parent_moves_child() {
    let mut scene = Scene::new();
    let parent = scene.create_model("parent", ObjectType::Null).unwrap();
    let child = scene.create_model("child", ObjectType::Null).unwrap();
    scene.add_child(parent, child).unwrap();

    scene
        .get_mut::<Model>(parent)
        .unwrap()
        .set_local_rotation(Some(DVec3::new(0.0, 0.0, 90.0)));
    scene
        .get_mut::<Model>(child)
        .unwrap()
        .set_local_translation(Some(DVec3::X));

    // Child sits on +X in parent space, which the parent turns onto +Y.
    let world = scene.global_transform(child).unwrap();
    let origin = world.transform_point3(DVec3::ZERO);
    assert!((origin - DVec3::Y).length() < EPS, "got {origin:?}");
}

#[test]
fn test_global_transform_recomputed_after_edit() {
    let mut scene = Scene::new();
    let parent = scene.create_model("parent", ObjectType::Null).unwrap();
    let child = scene.create_model("child", ObjectType::Null).unwrap();
    scene.add_child(parent, child).unwrap();

    let before = scene.global_transform(child).unwrap();
    scene
        .get_mut::<Model>(parent)
        .unwrap()
        .set_local_scale(Some(DVec3::splat(2.0)));
    let after = scene.global_transform(child).unwrap();

    assert!(matrix_approx_eq(&before, &DMat4::IDENTITY, EPS));
    assert!(matrix_approx_eq(&after, &DMat4::from_scale(DVec3::splat(2.0)), EPS));
}

#[test]
fn test_destroyed_model_references_dropped() {
    let mut scene = Scene::new();
    let mesh = scene.create_model("mesh", ObjectType::Mesh).unwrap();
    let material = scene.create_material("mat");
    let geometry = scene.geometry_builder("geo").build();
    scene.set_geometry(mesh, Some(geometry)).unwrap();
    scene.add_material(mesh, material).unwrap();

    scene.destroy(material).unwrap();
    scene.destroy(geometry).unwrap();
    let model = scene.get::<Model>(mesh).unwrap();
    assert!(model.materials().is_empty());
    assert_eq!(model.geometry(), None);
}
