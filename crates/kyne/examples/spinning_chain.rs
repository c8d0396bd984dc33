//! Spinning chain example — drives a three-frame chain through a revolution
//! and compares queried velocities against the analytic transport formula.

use kyne::{FrameId, FrameTree, Pose, SpatialVelocity, Vec3};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let omega = 0.8; // rad/s about z
    let arm = Vec3::new(1.0, 0.0, 0.0);

    // World → hub (spinning about z) → tip (1 m out along the hub's x axis).
    let mut tree = FrameTree::new();
    let hub = tree.add_free_frame("hub", FrameId::WORLD);
    tree.set_relative_spatial_velocity(
        hub,
        SpatialVelocity::new(Vec3::new(0.0, 0.0, omega), Vec3::zeros()),
    )
    .unwrap();
    let tip = tree.add_fixed_frame("tip", hub, Pose::from_translation(arm));

    let dt = 0.05;
    let steps = 40;
    println!("t(s)      tip position (world)            |v| queried   |v| = ω·r");
    for step in 0..=steps {
        let t = step as f64 * dt;
        tree.set_relative_transform(hub, Pose::rot_z(omega * t))
            .unwrap();

        let p = tree.world_transform(tip).pos;
        let v = tree.linear_velocity(tip, FrameId::WORLD, FrameId::WORLD);
        if step % 5 == 0 {
            println!(
                "{t:6.2}   [{:+7.4}, {:+7.4}, {:+7.4}]   {:9.6}     {:9.6}",
                p.x,
                p.y,
                p.z,
                v.norm(),
                omega * arm.norm(),
            );
        }
    }

    // A point offset from the tip moves faster, in proportion to its radius.
    let probe = Vec3::new(0.5, 0.0, 0.0);
    let v_probe = tree.spatial_velocity_of_point(tip, &probe);
    println!(
        "\nProbe 0.5 m past the tip: |v| = {:.6} (expected {:.6})",
        v_probe.linear().norm(),
        omega * (arm.norm() + probe.norm()),
    );
}
