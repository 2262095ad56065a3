//! Integration tests for the hierarchical transform system.

use kestrel::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Test mirror capturing the last uploaded world-matrix block.
#[derive(Default)]
struct CaptureMirror {
    frames: std::rc::Rc<std::cell::RefCell<Vec<Vec<Matrix4>>>>,
}

impl TransformMirror for CaptureMirror {
    fn capacity_matrices(&self) -> usize {
        MIRROR_DEFAULT_CAPACITY
    }

    fn write(&mut self, matrices: &[Matrix4]) {
        self.frames.borrow_mut().push(matrices.to_vec());
    }
}

#[test]
fn child_world_position_follows_parent() {
    let mut system = TransformSystem::new();
    let a = system.from_position(Vector3::new(1.0, 0.0, 0.0), 0);
    let b = system.from_position(Vector3::new(0.0, 1.0, 0.0), 0);
    system.parent_set(b, a);
    system.update();

    assert!(system
        .world_position_get(b)
        .approx_eq(&Vector3::new(1.0, 1.0, 0.0), 1e-6));
}

#[test]
fn parent_scale_propagates() {
    let mut system = TransformSystem::new();
    let a = system.from_position(Vector3::new(1.0, 0.0, 0.0), 0);
    let b = system.from_position(Vector3::new(0.0, 1.0, 0.0), 0);
    system.parent_set(b, a);
    system.update();

    system.scale_set(a, Vector3::splat(2.0));
    system.update();

    assert!(system
        .world_scale_get(b)
        .approx_eq(&Vector3::splat(2.0), 1e-6));
    assert!(system
        .world_position_get(b)
        .approx_eq(&Vector3::new(1.0, 2.0, 0.0), 1e-6));
}

#[test]
fn parse_canonical_form() {
    let mut system = TransformSystem::new();
    let id = system.from_str_form("1 2 3 0 0 0 1 1 1 1", 5).unwrap();

    assert!(system
        .position_get(id)
        .approx_eq(&Vector3::new(1.0, 2.0, 3.0), 1e-6));
    assert!(system
        .rotation_get(id)
        .approx_eq(&Quaternion::IDENTITY, 1e-6));
    assert!(system.scale_get(id).approx_eq(&Vector3::ONE, 1e-6));
    assert_eq!(system.user_get(id), 5);
}

#[test]
fn parse_failure_allocates_nothing() {
    let mut system = TransformSystem::new();
    let before = system.allocated();
    assert!(system.from_str_form("1 2 three", 0).is_err());
    assert_eq!(system.allocated(), before);
}

#[test]
fn depth_invariant_under_random_reparenting() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut system = TransformSystem::new();

    let handles: Vec<TransformId> = (0..30).map(|i| system.create(i)).collect();

    for _ in 0..200 {
        let child = rng.gen_range(1..handles.len());
        // Parenting only to lower slots keeps the relation acyclic
        let parent = if rng.gen_bool(0.2) {
            TransformId::INVALID
        } else {
            handles[rng.gen_range(0..child)]
        };
        system.parent_set(handles[child], parent);

        for &h in &handles {
            let p = system.parent_get(h);
            let expected = if p.is_valid() {
                system.depth_get(p) + 1
            } else {
                0
            };
            assert_eq!(system.depth_get(h), expected);
        }
    }
}

#[test]
fn world_chain_composes_locals() {
    let mut system = TransformSystem::new();
    let a = system.from_position_rotation_scale(
        Vector3::new(1.0, 2.0, 3.0),
        Quaternion::from_axis_angle(&Vector3::UNIT_Y, 0.4),
        Vector3::splat(2.0),
        0,
    );
    let b = system.from_position_rotation(
        Vector3::new(-1.0, 0.5, 0.0),
        Quaternion::from_axis_angle(&Vector3::UNIT_X, -0.2),
        0,
    );
    let c = system.from_position(Vector3::new(0.0, 0.0, 4.0), 0);
    system.parent_set(b, a);
    system.parent_set(c, b);
    system.update();

    let expected = system
        .local_get(a)
        .multiply(&system.local_get(b))
        .multiply(&system.local_get(c));
    assert!(system.world_get(c).approx_eq(&expected, 1e-5));
}

#[test]
fn string_round_trip_preserves_world() {
    let mut system = TransformSystem::new();
    let original = system.from_position_rotation_scale(
        Vector3::new(0.5, -1.25, 8.0),
        Quaternion::from_axis_angle(&Vector3::new(1.0, 1.0, 0.0).normalized(), 1.1),
        Vector3::new(2.0, 0.5, 1.5),
        0,
    );

    let text = system.to_str_form(original);
    let restored = system.from_str_form(&text, 0).unwrap();
    system.update();

    assert!(system
        .world_get(restored)
        .approx_eq(&system.world_get(original), 1e-5));
}

#[test]
fn update_twice_is_bitwise_stable() {
    let mut rng = StdRng::seed_from_u64(29);
    let mut system = TransformSystem::new();

    let handles: Vec<TransformId> = (0..20)
        .map(|i| {
            system.from_position_rotation_scale(
                Vector3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ),
                Quaternion::from_axis_angle(&Vector3::UNIT_Y, rng.gen_range(-3.0..3.0)),
                Vector3::splat(rng.gen_range(0.5..2.0)),
                i,
            )
        })
        .collect();
    for i in 1..handles.len() {
        if rng.gen_bool(0.7) {
            let parent = handles[rng.gen_range(0..i)];
            system.parent_set(handles[i], parent);
        }
    }

    system.update();
    let snapshot: Vec<Matrix4> = system.world_matrices().to_vec();
    system.update();
    for (before, after) in snapshot.iter().zip(system.world_matrices()) {
        assert!(before.bitwise_eq(after));
    }
}

#[test]
fn mirror_receives_world_block_each_update() {
    let mut system = TransformSystem::new();
    let frames = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    system.attach_mirror(Box::new(CaptureMirror {
        frames: frames.clone(),
    }));

    let a = system.from_position(Vector3::new(4.0, 0.0, 0.0), 0);
    system.update();

    system.position_set(a, Vector3::new(7.0, 0.0, 0.0));
    system.update();

    let frames = frames.borrow();
    assert_eq!(frames.len(), 2);
    let slot = a.index() as usize;
    assert!(frames[0][slot]
        .get_position()
        .approx_eq(&Vector3::new(4.0, 0.0, 0.0), 1e-6));
    assert!(frames[1][slot]
        .get_position()
        .approx_eq(&Vector3::new(7.0, 0.0, 0.0), 1e-6));
    assert_eq!(frames[1].len(), system.capacity());
}

#[test]
fn destroyed_handles_are_ignored_by_update() {
    let mut system = TransformSystem::new();
    let a = system.from_position(Vector3::new(1.0, 0.0, 0.0), 0);
    system.destroy(a);
    // The pending dirty entry must not resurrect the freed slot
    system.update();
    assert!(system
        .world_matrices()[a.index() as usize]
        .approx_eq(&Matrix4::IDENTITY, 1e-6));
}

#[test]
fn rotate_accumulates() {
    let mut system = TransformSystem::new();
    let id = system.create(0);
    let quarter = Quaternion::from_axis_angle(&Vector3::UNIT_Z, std::f32::consts::FRAC_PI_2);
    system.rotate(id, quarter);
    system.rotate(id, quarter);
    system.update();

    let world = system.world_get(id);
    let p = world.transform_point(&Vector3::UNIT_X);
    assert!(p.approx_eq(&Vector3::new(-1.0, 0.0, 0.0), 1e-5));
}
