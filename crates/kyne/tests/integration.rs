//! Scenario tests for the kyne frame tree.

use approx::assert_relative_eq;
use kyne::{
    FrameId, FrameKinematics, FrameSource, FrameTree, Pose, SpatialAcceleration, SpatialVelocity,
    StructureError, Vec3, Vec6,
};
use std::f64::consts::FRAC_PI_3;

/// World → a (spinning) → b (fixed offset, rotated): the textbook transport
/// scenario.
fn make_spinning_chain(omega: Vec3, offset: Vec3, angle: f64) -> (FrameTree, FrameId, FrameId) {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    tree.set_relative_spatial_velocity(a, SpatialVelocity::new(omega, Vec3::zeros()))
        .unwrap();
    let b = tree.add_fixed_frame("b", a, Pose::new(Pose::rot_z(angle).rot, offset));
    (tree, a, b)
}

#[test]
fn chain_velocity_matches_rigid_body_transport() {
    let omega = Vec3::new(0.0, 0.0, 1.2);
    let offset = Vec3::new(0.5, 0.0, 0.0);
    let (tree, _a, b) = make_spinning_chain(omega, offset, 0.7);

    // b is rigidly carried by a, so in world coordinates its spatial
    // velocity is the transport formula: angular part ω, linear part ω × p.
    let v = tree.spatial_velocity_relative(b, FrameId::WORLD, FrameId::WORLD);
    assert_relative_eq!(v.angular(), omega, epsilon = 1e-12);
    assert_relative_eq!(v.linear(), omega.cross(&offset), epsilon = 1e-12);

    // The classical projections agree.
    assert_relative_eq!(
        tree.linear_velocity(b, FrameId::WORLD, FrameId::WORLD),
        omega.cross(&offset),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        tree.angular_velocity(b, FrameId::WORLD, FrameId::WORLD),
        omega,
        epsilon = 1e-12
    );
}

#[test]
fn chain_acceleration_is_centripetal_in_classical_terms() {
    let omega = Vec3::new(0.0, 0.0, 2.0);
    let offset = Vec3::new(1.0, 0.0, 0.0);
    let (tree, _a, b) = make_spinning_chain(omega, offset, FRAC_PI_3);

    // Constant-rate spin: the spatial acceleration vanishes identically...
    assert_relative_eq!(
        tree.spatial_acceleration_relative(b, FrameId::WORLD, FrameId::WORLD)
            .data,
        Vec6::zeros(),
        epsilon = 1e-12
    );
    // ...while the classical acceleration of b's origin is centripetal.
    assert_relative_eq!(
        tree.linear_acceleration(b, FrameId::WORLD, FrameId::WORLD),
        omega.cross(&omega.cross(&offset)),
        epsilon = 1e-12
    );
}

#[test]
fn velocity_is_consistent_across_coordinate_frames() {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    tree.set_relative_transform(a, Pose::from_translation(Vec3::new(0.0, 0.0, 1.0)))
        .unwrap();
    tree.set_relative_spatial_velocity(
        a,
        SpatialVelocity::new(Vec3::new(0.0, 0.0, 0.4), Vec3::new(0.1, 0.0, 0.0)),
    )
    .unwrap();

    let b = tree.add_free_frame("b", a);
    tree.set_relative_transform(
        b,
        Pose::new(Pose::rot_z(0.7).rot, Vec3::new(0.5, 0.0, 0.0)),
    )
    .unwrap();
    let b_relative = SpatialVelocity::new(Vec3::new(0.2, 0.0, 0.3), Vec3::new(0.0, -0.1, 0.25));
    tree.set_relative_spatial_velocity(b, b_relative).unwrap();

    let q = tree.add_fixed_frame(
        "q",
        FrameId::WORLD,
        Pose::new(Pose::rot_x(1.1).rot, Vec3::new(2.0, -1.0, 0.5)),
    );

    // Ask for b's velocity relative to its parent in a third frame's
    // coordinates, then rotate it back into b: the round trip must recover
    // the relative velocity exactly.
    let in_q = tree.spatial_velocity_relative(b, a, q);
    let back = tree.transform(q, b).ad_rot(&in_q);
    assert_relative_eq!(back.data, b_relative.data, epsilon = 1e-12);
}

#[test]
fn composition_law_survives_mutation_sequences() {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    let b = tree.add_free_frame("b", a);
    let c = tree.add_fixed_frame(
        "c",
        b,
        Pose::new(Pose::rot_y(0.4).rot, Vec3::new(0.0, 0.0, 2.0)),
    );
    let d = tree.add_free_frame("d", FrameId::WORLD);

    tree.set_relative_transform(a, Pose::rot_z(0.3)).unwrap();
    tree.set_relative_transform(b, Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)))
        .unwrap();
    tree.set_parent(b, d).unwrap();
    tree.set_relative_transform(d, Pose::rot_x(-0.8)).unwrap();
    tree.set_parent(d, a).unwrap();

    for frame in [a, b, c, d] {
        let parent = tree.parent(frame).unwrap();
        let composed = tree.world_transform(parent) * tree.relative_transform(frame);
        let world = tree.world_transform(frame);
        assert_relative_eq!(world.rot, composed.rot, epsilon = 1e-12);
        assert_relative_eq!(world.pos, composed.pos, epsilon = 1e-12);
    }
}

#[test]
fn reparenting_changes_world_pose_until_compensated() {
    let mut tree = FrameTree::new();
    let p1 = tree.add_fixed_frame(
        "p1",
        FrameId::WORLD,
        Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)),
    );
    let p2 = tree.add_fixed_frame(
        "p2",
        FrameId::WORLD,
        Pose::new(Pose::rot_z(0.5).rot, Vec3::new(0.0, 0.0, 3.0)),
    );
    let f = tree.add_free_frame("f", p1);
    tree.set_relative_transform(f, Pose::from_translation(Vec3::new(0.0, 2.0, 0.0)))
        .unwrap();

    let before = tree.world_transform(f);
    tree.set_parent(f, p2).unwrap();
    let after = tree.world_transform(f);
    // The relative pose rode along unchanged, so the world pose moved.
    assert!((after.pos - before.pos).norm() > 1e-6);

    // Compensating the relative pose restores the old world pose.
    let compensated = tree.world_transform(p2).inverse() * before;
    tree.set_relative_transform(f, compensated).unwrap();
    let restored = tree.world_transform(f);
    assert_relative_eq!(restored.rot, before.rot, epsilon = 1e-12);
    assert_relative_eq!(restored.pos, before.pos, epsilon = 1e-12);
}

#[test]
fn cycle_rejection_reports_and_leaves_tree_unchanged() {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    let b = tree.add_free_frame("b", a);
    let before = tree.world_transform(b);

    let err = tree.set_parent(a, b).unwrap_err();
    assert_eq!(err, StructureError::WouldCycle { frame: a, new_parent: b });
    assert_eq!(tree.parent(a), Some(FrameId::WORLD));
    assert_eq!(tree.parent(b), Some(a));
    let after = tree.world_transform(b);
    assert_relative_eq!(after.pos, before.pos, epsilon = 1e-12);
}

#[test]
fn world_constants_ignore_invalidation() {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    tree.set_relative_transform(a, Pose::rot_z(1.0)).unwrap();
    tree.notify_transform_update(FrameId::WORLD);
    tree.notify_velocity_update(FrameId::WORLD);
    tree.notify_acceleration_update(FrameId::WORLD);

    let world = tree.world_transform(FrameId::WORLD);
    assert_relative_eq!(world.rot, Pose::identity().rot, epsilon = 1e-12);
    assert_relative_eq!(world.pos, Vec3::zeros(), epsilon = 1e-12);
    assert_relative_eq!(
        tree.spatial_velocity(FrameId::WORLD).data,
        Vec6::zeros(),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        tree.spatial_acceleration(FrameId::WORLD).data,
        Vec6::zeros(),
        epsilon = 1e-12
    );
}

#[test]
fn entities_relay_ancestry_changes() {
    let mut tree = FrameTree::new();
    let a = tree.add_free_frame("a", FrameId::WORLD);
    let b = tree.add_fixed_frame("b", a, Pose::from_translation(Vec3::new(0.0, 1.0, 0.0)));
    let sensor = tree.add_entity("sensor", b);
    tree.clear_entity_changes(sensor);

    // A pose change two levels up reaches the entity with the full cascade.
    tree.set_relative_transform(a, Pose::rot_z(0.2)).unwrap();
    let changes = tree.entity_changes(sensor);
    assert!(changes.transform && changes.velocity && changes.acceleration);

    // A velocity-only change leaves the transform flag down.
    tree.clear_entity_changes(sensor);
    tree.set_relative_spatial_velocity(
        a,
        SpatialVelocity::new(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros()),
    )
    .unwrap();
    let changes = tree.entity_changes(sensor);
    assert!(!changes.transform);
    assert!(changes.velocity && changes.acceleration);
}

/// A one-axis joint provider: rotates about its parent's z axis.
struct Gimbal {
    angle: f64,
    rate: f64,
}

impl FrameKinematics for Gimbal {
    fn relative_transform(&self) -> Pose {
        Pose::rot_z(self.angle)
    }

    fn relative_spatial_velocity(&self) -> SpatialVelocity {
        SpatialVelocity::new(Vec3::new(0.0, 0.0, self.rate), Vec3::zeros())
    }

    fn primary_relative_acceleration(&self) -> SpatialAcceleration {
        SpatialAcceleration::zero()
    }

    // Attached to the world, so the frame's total velocity equals its
    // relative velocity and the coupling term vanishes.
    fn partial_acceleration(&self) -> SpatialAcceleration {
        SpatialAcceleration::zero()
    }
}

#[test]
fn custom_provider_drives_the_tree() {
    let mut tree = FrameTree::new();
    let joint = tree.add_frame(
        "joint",
        FrameId::WORLD,
        FrameSource::Custom(Box::new(Gimbal {
            angle: 0.0,
            rate: 1.5,
        })),
    );
    let tip = tree.add_fixed_frame(
        "tip",
        joint,
        Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)),
    );

    assert_relative_eq!(
        tree.world_transform(tip).pos,
        Vec3::new(1.0, 0.0, 0.0),
        epsilon = 1e-12
    );
    // The tip sweeps with the joint rate.
    assert_relative_eq!(
        tree.linear_velocity(tip, FrameId::WORLD, FrameId::WORLD),
        Vec3::new(0.0, 1.5, 0.0),
        epsilon = 1e-12
    );

    // Advance the joint and notify; the stale subtree rebuilds on demand.
    let gimbal = tree.kinematics_mut::<Gimbal>(joint).unwrap();
    gimbal.angle = std::f64::consts::FRAC_PI_2;
    tree.notify_transform_update(joint);

    assert_relative_eq!(
        tree.world_transform(tip).pos,
        Vec3::new(0.0, 1.0, 0.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        tree.linear_velocity(tip, FrameId::WORLD, FrameId::WORLD),
        Vec3::new(-1.5, 0.0, 0.0),
        epsilon = 1e-12
    );

    // Downcasting to the wrong provider type yields nothing.
    assert!(tree.kinematics_mut::<OtherProvider>(joint).is_none());
}

struct OtherProvider;

impl FrameKinematics for OtherProvider {
    fn relative_transform(&self) -> Pose {
        Pose::identity()
    }
    fn relative_spatial_velocity(&self) -> SpatialVelocity {
        SpatialVelocity::zero()
    }
    fn primary_relative_acceleration(&self) -> SpatialAcceleration {
        SpatialAcceleration::zero()
    }
    fn partial_acceleration(&self) -> SpatialAcceleration {
        SpatialAcceleration::zero()
    }
}
