use std::sync::{Arc, Mutex};
use std::thread;

use glam::Vec2;
use pulley_joints::{
    step_worlds, BodySet, Joint, PhysicsBody, PhysicsWorld, PinJoint, PulleyJoint, RigidBody,
};

fn atwood_world(mass1: f32) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(1.0 / 60.0);
    let a = world.add_body(RigidBody::new(Vec2::new(-1.0, 0.0)).with_mass(
        pulley_joints::MassProperties::new(mass1, 1.0),
    ));
    let b = world.add_body(RigidBody::new(Vec2::new(1.0, 0.0)));
    let joint = PulleyJoint::<RigidBody>::new(
        world.bodies(),
        a,
        b,
        Vec2::new(-1.0, 4.0),
        Vec2::new(1.0, 4.0),
        Vec2::new(-1.0, 0.0),
        Vec2::new(1.0, 0.0),
    )
    .unwrap();
    world.add_joint(joint).unwrap();
    world
}

fn positions(world: &PhysicsWorld) -> Vec<Vec2> {
    world
        .bodies()
        .iter()
        .map(|(_, body)| body.transform().position)
        .collect()
}

#[test]
fn test_core_types_are_sync_and_send() {
    fn assert_sync_send<T: Sync + Send + ?Sized>() {}
    assert_sync_send::<PhysicsWorld>();
    assert_sync_send::<BodySet>();
    assert_sync_send::<dyn Joint>();
    assert_sync_send::<dyn PhysicsBody>();
    assert_sync_send::<PulleyJoint>();
    assert_sync_send::<PinJoint>();
}

#[test]
fn test_step_worlds_matches_sequential_stepping() {
    let mut batch: Vec<PhysicsWorld> = (1..=4).map(|i| atwood_world(i as f32)).collect();
    let mut reference: Vec<PhysicsWorld> = (1..=4).map(|i| atwood_world(i as f32)).collect();

    for _ in 0..30 {
        step_worlds(&mut batch, 1.0 / 60.0);
        for world in &mut reference {
            world.step(1.0 / 60.0);
        }
    }

    for (stepped, expected) in batch.iter().zip(&reference) {
        assert_eq!(positions(stepped), positions(expected));
    }
}

#[test]
fn test_worlds_on_separate_threads() {
    let handles: Vec<_> = (1..=4)
        .map(|i| {
            thread::spawn(move || {
                let mut world = atwood_world(i as f32);
                for _ in 0..30 {
                    world.step(1.0 / 60.0);
                }
                positions(&world)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.is_finite()));
    }
}

#[test]
fn test_shared_world_across_threads() {
    let world = Arc::new(Mutex::new(atwood_world(2.0)));

    let mut handles = vec![];
    for _ in 0..4 {
        let world_clone = Arc::clone(&world);
        handles.push(thread::spawn(move || {
            let mut world = world_clone.lock().unwrap();
            world.step(1.0 / 60.0);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(world.lock().unwrap().solver_metrics().joints_solved == 1);
}
