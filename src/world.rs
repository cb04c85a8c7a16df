use std::sync::Mutex;

use rapier2d::{geometry::DefaultBroadPhase, prelude::*};

use crate::config::PhysicsConfig;
use crate::physics::{to_sim_vec, RigidBodySnapshot};
use crate::pulley_joint::{PulleyJoint, PulleyJointDesc, PulleyJointHandle};

/// Contact between two bodies reported by the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyContact {
    pub body1: RigidBodyHandle,
    pub body2: RigidBodyHandle,
    pub started: bool,
}

/// Collects collision events raised during a pipeline step.
#[derive(Default)]
struct ContactCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl ContactCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

pub struct SimulationWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    velocity_iterations: usize,
    position_iterations: usize,
    pub(crate) island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) rigid_body_set: RigidBodySet,
    pub(crate) collider_set: ColliderSet,
    pub(crate) impulse_joint_set: ImpulseJointSet,
    pub(crate) multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pulley_joints: Vec<PulleyJoint>,
    contacts: ContactCollector,
    time: Real,
}

impl SimulationWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.dt;

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_sim_vec(config.gravity),
            integration_parameters,
            velocity_iterations: config.velocity_iterations,
            position_iterations: config.position_iterations,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pulley_joints: Vec::new(),
            contacts: ContactCollector::default(),
            time: 0.0,
        }
    }

    /// Advances the simulation by one fixed step and returns the contacts
    /// that started or stopped during it.
    pub fn step(&mut self) -> Vec<BodyContact> {
        let physics_hooks = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &physics_hooks,
            &self.contacts,
        );

        for _ in 0..self.velocity_iterations {
            for joint in &self.pulley_joints {
                joint.solve_velocity(&mut self.rigid_body_set);
            }
        }
        for _ in 0..self.position_iterations {
            for joint in &self.pulley_joints {
                joint.solve_position(&mut self.rigid_body_set);
            }
        }

        self.time += self.integration_parameters.dt;
        self.drain_contacts()
    }

    fn drain_contacts(&self) -> Vec<BodyContact> {
        self.contacts
            .drain()
            .into_iter()
            .filter_map(|event| {
                let (c1, c2, started) = match event {
                    CollisionEvent::Started(c1, c2, _) => (c1, c2, true),
                    CollisionEvent::Stopped(c1, c2, _) => (c1, c2, false),
                };
                let body1 = self.collider_set.get(c1)?.parent()?;
                let body2 = self.collider_set.get(c2)?.parent()?;
                Some(BodyContact { body1, body2, started })
            })
            .collect()
    }

    pub fn time(&self) -> Real {
        self.time
    }

    pub fn dt(&self) -> Real {
        self.integration_parameters.dt
    }

    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    pub fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.rigid_body_set.insert(body)
    }

    /// Restitution of a contact is the larger of the two colliders' values;
    /// friction is their average.
    pub fn insert_collider(&mut self, mut collider: Collider, parent: RigidBodyHandle) -> ColliderHandle {
        collider.set_restitution_combine_rule(CoefficientCombineRule::Max);
        collider.set_friction_combine_rule(CoefficientCombineRule::Average);
        self.collider_set
            .insert_with_parent(collider, parent, &mut self.rigid_body_set)
    }

    pub fn insert_joint(
        &mut self,
        body1: RigidBodyHandle,
        body2: RigidBodyHandle,
        joint: impl Into<GenericJoint>,
    ) -> ImpulseJointHandle {
        self.impulse_joint_set.insert(body1, body2, joint, true)
    }

    /// Returns `None` if either body is not in this world.
    pub fn insert_pulley_joint(&mut self, desc: &PulleyJointDesc) -> Option<PulleyJointHandle> {
        let joint = PulleyJoint::new(desc, &self.rigid_body_set)?;
        self.pulley_joints.push(joint);
        Some(PulleyJointHandle(self.pulley_joints.len() - 1))
    }

    pub fn pulley_joint(&self, handle: PulleyJointHandle) -> Option<&PulleyJoint> {
        self.pulley_joints.get(handle.0)
    }

    /// Current rope length between the first ground anchor and its body.
    pub fn pulley_length_a(&self, handle: PulleyJointHandle) -> Option<Real> {
        self.pulley_joint(handle)
            .map(|joint| joint.current_length_a(&self.rigid_body_set))
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.rigid_body_set.get_mut(handle)
    }

    pub fn contains_body(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    pub fn colliders_of(&self, handle: RigidBodyHandle) -> usize {
        self.body(handle).map(|body| body.colliders().len()).unwrap_or(0)
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn body_snapshot(&self, handle: RigidBodyHandle) -> Option<RigidBodySnapshot> {
        self.rigid_body_set
            .get(handle)
            .map(|body| RigidBodySnapshot {
                position: [body.translation().x as f32, body.translation().y as f32],
                velocity: [body.linvel().x as f32, body.linvel().y as f32],
                rotation: body.rotation().angle() as f32,
            })
    }

    /// Sets the target velocity of the rotational motor of a joint.
    pub fn set_motor_speed(&mut self, joint_handle: ImpulseJointHandle, speed: Real) {
        if let Some(joint) = self.impulse_joint_set.get_mut(joint_handle, true) {
            let factor = joint
                .data
                .motor(JointAxis::AngX)
                .map(|motor| motor.damping)
                .unwrap_or(1.0);
            joint.data.set_motor_velocity(JointAxis::AngX, speed, factor);
        }
    }

    pub fn motor_speed(&self, joint_handle: ImpulseJointHandle) -> Option<Real> {
        self.impulse_joint_set
            .get(joint_handle)
            .and_then(|joint| joint.data.motor(JointAxis::AngX))
            .map(|motor| motor.target_vel)
    }

    /// Teleports a body to `angle` about its current position.
    pub fn set_body_angle(&mut self, handle: RigidBodyHandle, angle: Real) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let translation = *body.translation();
            body.set_position(Isometry::new(translation, angle), true);
        }
    }
}
