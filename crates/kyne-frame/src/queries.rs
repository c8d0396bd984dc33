//! World- and relative-quantity queries over the frame tree.
//!
//! Everything here takes `&self`: a query may lazily refresh a stale cache
//! of the queried frame (or its ancestors) but never changes any other
//! observable state.

use kyne_math::{Pose, SpatialVec, Vec3};
use tracing::trace;

use crate::kinematics::FrameSource;
use crate::tree::{FrameId, FrameTree};

impl FrameTree {
    //--------------------------------------------------------------------
    // Relative quantities (straight from the frame's source)
    //--------------------------------------------------------------------

    /// Pose of `frame` relative to its parent.
    pub fn relative_transform(&self, frame: FrameId) -> Pose {
        match &self.node(frame).source {
            FrameSource::World => Pose::identity(),
            FrameSource::Fixed(pose) => *pose,
            FrameSource::Free(state) => state.pose,
            FrameSource::Custom(kinematics) => kinematics.relative_transform(),
        }
    }

    /// Spatial velocity of `frame` relative to its parent, in its own
    /// coordinates.
    pub fn relative_spatial_velocity(&self, frame: FrameId) -> SpatialVec {
        match &self.node(frame).source {
            FrameSource::World | FrameSource::Fixed(_) => SpatialVec::zero(),
            FrameSource::Free(state) => state.velocity,
            FrameSource::Custom(kinematics) => kinematics.relative_spatial_velocity(),
        }
    }

    /// The non-velocity-coupled part of the relative acceleration.
    pub fn primary_relative_acceleration(&self, frame: FrameId) -> SpatialVec {
        match &self.node(frame).source {
            FrameSource::World | FrameSource::Fixed(_) => SpatialVec::zero(),
            FrameSource::Free(state) => state.acceleration,
            FrameSource::Custom(kinematics) => kinematics.primary_relative_acceleration(),
        }
    }

    /// The velocity-coupling part of the relative acceleration.
    ///
    /// For free frames this is derived here as the motion cross product of
    /// the frame's total spatial velocity with its relative velocity, the
    /// transport term that falls out of differentiating the velocity
    /// composition. Custom providers supply their own.
    pub fn partial_acceleration(&self, frame: FrameId) -> SpatialVec {
        match &self.node(frame).source {
            FrameSource::World | FrameSource::Fixed(_) => SpatialVec::zero(),
            FrameSource::Free(state) => self.spatial_velocity(frame).cross_motion(&state.velocity),
            FrameSource::Custom(kinematics) => kinematics.partial_acceleration(),
        }
    }

    /// Full spatial acceleration of `frame` relative to its parent.
    pub fn relative_spatial_acceleration(&self, frame: FrameId) -> SpatialVec {
        self.primary_relative_acceleration(frame) + self.partial_acceleration(frame)
    }

    //--------------------------------------------------------------------
    // World quantities (cached)
    //--------------------------------------------------------------------

    /// Pose of `frame` relative to the world.
    ///
    /// Rebuilt lazily as `parent_world ∘ relative`; the recursion bottoms
    /// out at the world frame's identity.
    pub fn world_transform(&self, frame: FrameId) -> Pose {
        let node = self.node(frame);
        let Some(parent) = node.parent else {
            return Pose::identity();
        };
        if node.cache.transform_dirty.get() {
            trace!(?frame, "rebuilding world transform");
            let world = self.world_transform(parent) * self.relative_transform(frame);
            node.cache.world_transform.set(world);
            node.cache.transform_dirty.set(false);
        }
        node.cache.world_transform.get()
    }

    /// Pose of `frame` in the coordinates of `with_respect_to`.
    pub fn transform(&self, frame: FrameId, with_respect_to: FrameId) -> Pose {
        if with_respect_to == FrameId::WORLD {
            return self.world_transform(frame);
        }
        if with_respect_to == frame {
            return Pose::identity();
        }
        self.world_transform(with_respect_to).inverse() * self.world_transform(frame)
    }

    /// Total spatial velocity of `frame` (relative to the world), in its own
    /// coordinates.
    pub fn spatial_velocity(&self, frame: FrameId) -> SpatialVec {
        let node = self.node(frame);
        let Some(parent) = node.parent else {
            return SpatialVec::zero();
        };
        if node.cache.velocity_dirty.get() {
            trace!(?frame, "rebuilding spatial velocity");
            let velocity = self
                .relative_transform(frame)
                .ad_inv(&self.spatial_velocity(parent))
                + self.relative_spatial_velocity(frame);
            node.cache.velocity.set(velocity);
            node.cache.velocity_dirty.set(false);
        }
        node.cache.velocity.get()
    }

    /// Total spatial acceleration of `frame` (relative to the world), in its
    /// own coordinates.
    pub fn spatial_acceleration(&self, frame: FrameId) -> SpatialVec {
        let node = self.node(frame);
        let Some(parent) = node.parent else {
            return SpatialVec::zero();
        };
        if node.cache.acceleration_dirty.get() {
            trace!(?frame, "rebuilding spatial acceleration");
            let acceleration = self
                .relative_transform(frame)
                .ad_inv(&self.spatial_acceleration(parent))
                + self.partial_acceleration(frame)
                + self.primary_relative_acceleration(frame);
            node.cache.acceleration.set(acceleration);
            node.cache.acceleration_dirty.set(false);
        }
        node.cache.acceleration.get()
    }

    //--------------------------------------------------------------------
    // Velocity between arbitrary frames
    //--------------------------------------------------------------------

    /// Spatial velocity of `frame` relative to `relative_to`, expressed in
    /// the coordinates of `in_coordinates_of`.
    pub fn spatial_velocity_relative(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> SpatialVec {
        if relative_to == frame {
            return SpatialVec::zero();
        }
        if relative_to == FrameId::WORLD {
            let velocity = self.spatial_velocity(frame);
            if in_coordinates_of == frame {
                return velocity;
            }
            return self.transform(frame, in_coordinates_of).ad_rot(&velocity);
        }
        let velocity = self.spatial_velocity(frame)
            - self
                .transform(relative_to, frame)
                .ad(&self.spatial_velocity(relative_to));
        if in_coordinates_of == frame {
            return velocity;
        }
        self.transform(frame, in_coordinates_of).ad_rot(&velocity)
    }

    /// Spatial velocity of a point fixed in `frame` at `offset` from its
    /// origin, relative to the world, in the frame's own coordinates.
    pub fn spatial_velocity_of_point(&self, frame: FrameId, offset: &Vec3) -> SpatialVec {
        let velocity = self.spatial_velocity(frame);
        SpatialVec::new(
            velocity.angular(),
            velocity.linear() + velocity.angular().cross(offset),
        )
    }

    /// Spatial velocity of a point fixed in `frame`, relative to an
    /// arbitrary frame, expressed in the coordinates of another.
    pub fn spatial_velocity_of_point_relative(
        &self,
        frame: FrameId,
        offset: &Vec3,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> SpatialVec {
        if relative_to == frame {
            return SpatialVec::zero();
        }
        let velocity = self.spatial_velocity_relative(frame, relative_to, frame);
        let velocity = SpatialVec::new(
            velocity.angular(),
            velocity.linear() + velocity.angular().cross(offset),
        );
        if in_coordinates_of == frame {
            return velocity;
        }
        self.transform(frame, in_coordinates_of).ad_rot(&velocity)
    }

    //--------------------------------------------------------------------
    // Acceleration between arbitrary frames
    //--------------------------------------------------------------------

    /// Spatial acceleration of `frame` relative to `relative_to`, expressed
    /// in the coordinates of `in_coordinates_of`.
    ///
    /// The general case subtracts the reference frame's acceleration
    /// re-expressed into this frame and restores the velocity coupling
    /// between the two motions with a spatial cross term.
    pub fn spatial_acceleration_relative(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> SpatialVec {
        if relative_to == frame {
            return SpatialVec::zero();
        }
        if relative_to == FrameId::WORLD {
            let acceleration = self.spatial_acceleration(frame);
            if in_coordinates_of == frame {
                return acceleration;
            }
            return self
                .transform(frame, in_coordinates_of)
                .ad_rot(&acceleration);
        }
        let reference_to_frame = self.transform(relative_to, frame);
        let acceleration = self.spatial_acceleration(frame)
            - reference_to_frame.ad(&self.spatial_acceleration(relative_to))
            + self
                .spatial_velocity(frame)
                .cross_motion(&reference_to_frame.ad(&self.spatial_velocity(relative_to)));
        if in_coordinates_of == frame {
            return acceleration;
        }
        self.transform(frame, in_coordinates_of).ad_rot(&acceleration)
    }

    /// Spatial acceleration of a point fixed in `frame` at `offset`,
    /// relative to the world, in the frame's own coordinates.
    pub fn spatial_acceleration_of_point(&self, frame: FrameId, offset: &Vec3) -> SpatialVec {
        let acceleration = self.spatial_acceleration(frame);
        let angular_velocity = self.spatial_velocity(frame).angular();
        SpatialVec::new(
            acceleration.angular(),
            acceleration.linear()
                + acceleration.angular().cross(offset)
                + angular_velocity.cross(&angular_velocity.cross(offset)),
        )
    }

    /// Spatial acceleration of a point fixed in `frame`, relative to an
    /// arbitrary frame, expressed in the coordinates of another.
    pub fn spatial_acceleration_of_point_relative(
        &self,
        frame: FrameId,
        offset: &Vec3,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> SpatialVec {
        if relative_to == frame {
            return SpatialVec::zero();
        }
        let acceleration = self.spatial_acceleration_relative(frame, relative_to, frame);
        let angular_velocity = self
            .spatial_velocity_relative(frame, relative_to, frame)
            .angular();
        let acceleration = SpatialVec::new(
            acceleration.angular(),
            acceleration.linear()
                + acceleration.angular().cross(offset)
                + angular_velocity.cross(&angular_velocity.cross(offset)),
        );
        if in_coordinates_of == frame {
            return acceleration;
        }
        self.transform(frame, in_coordinates_of).ad_rot(&acceleration)
    }

    //--------------------------------------------------------------------
    // Classical projections
    //--------------------------------------------------------------------

    /// Linear velocity of `frame`'s origin relative to `relative_to`,
    /// expressed in `in_coordinates_of`.
    pub fn linear_velocity(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> Vec3 {
        self.spatial_velocity_relative(frame, relative_to, in_coordinates_of)
            .linear()
    }

    /// Angular velocity of `frame` relative to `relative_to`, expressed in
    /// `in_coordinates_of`.
    pub fn angular_velocity(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> Vec3 {
        self.spatial_velocity_relative(frame, relative_to, in_coordinates_of)
            .angular()
    }

    /// Classical linear acceleration of `frame`'s origin: the time
    /// derivative of the classical linear velocity, which adds the `w × v`
    /// term the spatial convention leaves out.
    pub fn linear_acceleration(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> Vec3 {
        if relative_to == frame {
            return Vec3::zeros();
        }
        let velocity = self.spatial_velocity_relative(frame, relative_to, frame);
        let acceleration = self.spatial_acceleration_relative(frame, relative_to, frame);
        let classical = acceleration.linear() + velocity.angular().cross(&velocity.linear());
        if in_coordinates_of == frame {
            return classical;
        }
        self.transform(frame, in_coordinates_of).rotate(&classical)
    }

    /// Angular acceleration of `frame` relative to `relative_to`, expressed
    /// in `in_coordinates_of`.
    pub fn angular_acceleration(
        &self,
        frame: FrameId,
        relative_to: FrameId,
        in_coordinates_of: FrameId,
    ) -> Vec3 {
        self.spatial_acceleration_relative(frame, relative_to, in_coordinates_of)
            .angular()
    }

    //--------------------------------------------------------------------
    // Rendering
    //--------------------------------------------------------------------

    /// Depth-first visualization pass: invoke the draw hook of every custom
    /// frame in the subtree rooted at `frame` with its current world pose.
    ///
    /// Read-only end to end; at most it refreshes stale caches.
    pub fn draw(&self, frame: FrameId) {
        let node = self.node(frame);
        if let FrameSource::Custom(kinematics) = &node.source {
            kinematics.draw(&self.world_transform(frame));
        }
        for &child in &node.child_frames {
            self.draw(child);
        }
    }
}
