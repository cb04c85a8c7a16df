//! Rope-and-pulley constraint between two bodies.
//!
//! Each body hangs from a fixed ground anchor. The constraint keeps
//! `length_a + ratio * length_b` equal to the value it had when the joint was
//! created, so pulling one side down lifts the other. It is solved by
//! iterative relaxation after the rigid-body step: a velocity pass removes
//! the rate of change of the total rope length, a position pass removes the
//! accumulated drift.

use rapier2d::prelude::*;

/// Ropes shorter than this are treated as slack anchors and skipped.
const MIN_ROPE_LENGTH: Real = 1.0e-4;

/// Arena index of a pulley joint inside a `SimulationWorld`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PulleyJointHandle(pub(crate) usize);

/// Everything needed to create a pulley joint, in world coordinates.
#[derive(Debug, Clone)]
pub struct PulleyJointDesc {
    pub body_a: RigidBodyHandle,
    pub body_b: RigidBodyHandle,
    pub ground_anchor_a: Point<Real>,
    pub ground_anchor_b: Point<Real>,
    pub anchor_a: Point<Real>,
    pub anchor_b: Point<Real>,
    pub ratio: Real,
}

#[derive(Debug, Clone)]
pub struct PulleyJoint {
    body_a: RigidBodyHandle,
    body_b: RigidBodyHandle,
    ground_anchor_a: Point<Real>,
    ground_anchor_b: Point<Real>,
    local_anchor_a: Point<Real>,
    local_anchor_b: Point<Real>,
    ratio: Real,
    total_length: Real,
}

/// One side of the rope: world anchor on the body and the unit direction from
/// the ground anchor to it.
struct RopeSide {
    direction: Vector<Real>,
    length: Real,
    inv_mass: Real,
}

impl PulleyJoint {
    /// Returns `None` if either body is missing from `bodies`.
    pub fn new(desc: &PulleyJointDesc, bodies: &RigidBodySet) -> Option<Self> {
        let body_a = bodies.get(desc.body_a)?;
        let body_b = bodies.get(desc.body_b)?;
        let local_anchor_a = body_a.position().inverse_transform_point(&desc.anchor_a);
        let local_anchor_b = body_b.position().inverse_transform_point(&desc.anchor_b);
        let length_a = (desc.anchor_a - desc.ground_anchor_a).norm();
        let length_b = (desc.anchor_b - desc.ground_anchor_b).norm();

        Some(Self {
            body_a: desc.body_a,
            body_b: desc.body_b,
            ground_anchor_a: desc.ground_anchor_a,
            ground_anchor_b: desc.ground_anchor_b,
            local_anchor_a,
            local_anchor_b,
            ratio: desc.ratio,
            total_length: length_a + desc.ratio * length_b,
        })
    }

    pub fn bodies(&self) -> (RigidBodyHandle, RigidBodyHandle) {
        (self.body_a, self.body_b)
    }

    pub fn ratio(&self) -> Real {
        self.ratio
    }

    pub fn ground_anchors(&self) -> (Point<Real>, Point<Real>) {
        (self.ground_anchor_a, self.ground_anchor_b)
    }

    pub fn current_length_a(&self, bodies: &RigidBodySet) -> Real {
        Self::rope_length(bodies, self.body_a, &self.local_anchor_a, &self.ground_anchor_a)
    }

    pub fn current_length_b(&self, bodies: &RigidBodySet) -> Real {
        Self::rope_length(bodies, self.body_b, &self.local_anchor_b, &self.ground_anchor_b)
    }

    fn rope_length(
        bodies: &RigidBodySet,
        handle: RigidBodyHandle,
        local_anchor: &Point<Real>,
        ground_anchor: &Point<Real>,
    ) -> Real {
        bodies
            .get(handle)
            .map(|body| (body.position() * local_anchor - ground_anchor).norm())
            .unwrap_or(0.0)
    }

    fn side(
        bodies: &RigidBodySet,
        handle: RigidBodyHandle,
        local_anchor: &Point<Real>,
        ground_anchor: &Point<Real>,
    ) -> Option<RopeSide> {
        let body = bodies.get(handle)?;
        let offset = body.position() * local_anchor - ground_anchor;
        let length = offset.norm();
        if length < MIN_ROPE_LENGTH {
            return None;
        }
        let inv_mass = if body.is_dynamic() && body.mass() > 0.0 {
            1.0 / body.mass()
        } else {
            0.0
        };
        Some(RopeSide {
            direction: offset / length,
            length,
            inv_mass,
        })
    }

    fn sides(&self, bodies: &RigidBodySet) -> Option<(RopeSide, RopeSide, Real)> {
        let a = Self::side(bodies, self.body_a, &self.local_anchor_a, &self.ground_anchor_a)?;
        let b = Self::side(bodies, self.body_b, &self.local_anchor_b, &self.ground_anchor_b)?;
        let effective = a.inv_mass + self.ratio * self.ratio * b.inv_mass;
        if effective <= 0.0 {
            return None;
        }
        Some((a, b, effective))
    }

    /// Removes the component of the bodies' velocities that would change the
    /// total rope length.
    pub fn solve_velocity(&self, bodies: &mut RigidBodySet) {
        let Some((a, b, effective)) = self.sides(bodies) else {
            return;
        };
        let (Some(vel_a), Some(vel_b)) = (
            bodies.get(self.body_a).map(|body| *body.linvel()),
            bodies.get(self.body_b).map(|body| *body.linvel()),
        ) else {
            return;
        };

        let rate = a.direction.dot(&vel_a) + self.ratio * b.direction.dot(&vel_b);
        let lambda = rate / effective;

        if let Some(body) = bodies.get_mut(self.body_a) {
            body.set_linvel(vel_a - a.direction * (a.inv_mass * lambda), true);
        }
        if let Some(body) = bodies.get_mut(self.body_b) {
            body.set_linvel(vel_b - b.direction * (b.inv_mass * self.ratio * lambda), true);
        }
    }

    /// Moves the bodies back onto the rope-length manifold. Returns the
    /// length error before correction.
    pub fn solve_position(&self, bodies: &mut RigidBodySet) -> Real {
        let Some((a, b, effective)) = self.sides(bodies) else {
            return 0.0;
        };
        let error = a.length + self.ratio * b.length - self.total_length;
        let lambda = error / effective;

        if let Some(body) = bodies.get_mut(self.body_a) {
            let shifted = body.translation() - a.direction * (a.inv_mass * lambda);
            body.set_translation(shifted, true);
        }
        if let Some(body) = bodies.get_mut(self.body_b) {
            let shifted = body.translation() - b.direction * (b.inv_mass * self.ratio * lambda);
            body.set_translation(shifted, true);
        }
        error
    }
}
