//! Adapter over the rigid-body physics world.
//!
//! The rest of the crate treats physics as an external collaborator with a
//! small contract: insert/remove bodies, clear accumulated forces, advance
//! one step, and read per-body kinematic state. This module pins that
//! contract onto `rapier2d` and keeps pipeline plumbing out of the core.

// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use rapier2d::prelude::{
    BroadPhase, CCDSolver, Collider, ColliderHandle, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real,
    RigidBody, RigidBodyHandle, RigidBodySet, Vector,
};

// Layer 3: Internal module imports
use crate::wire::{BodySnapshot, Vec2};

/// Handle of a body owned by the world.
pub type BodyHandle = RigidBodyHandle;

/// The authoritative 2D physics world.
///
/// Gravity is zero: sessions are top-down, and anything that pulls or pushes
/// does so through controllers.
pub struct World {
    gravity: Vector<Real>,
    integration: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            gravity: Vector::zeros(),
            integration: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
        }
    }

    /// Insert a body and return its handle.
    pub fn insert_body(&mut self, body: RigidBody) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Attach a collider to an existing body.
    pub fn attach_collider(&mut self, collider: Collider, parent: BodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Remove a body and everything attached to it.
    pub fn remove_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Read access to a body.
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Write access to a body.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    /// Number of bodies currently owned by the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Zero the user forces and torques accumulated on every body.
    ///
    /// Called at the top of each tick, before controllers run.
    pub fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    /// Advance the simulation by `dt`. A zero `dt` is a no-op.
    pub fn step(&mut self, dt: Duration) {
        if dt.is_zero() {
            return;
        }
        self.integration.dt = dt.as_secs_f32();
        self.pipeline.step(
            &self.gravity,
            &self.integration,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    /// Kinematic state of one body, in wire form.
    pub fn snapshot(&self, handle: BodyHandle) -> Option<BodySnapshot> {
        let body = self.bodies.get(handle)?;
        let translation = body.translation();
        let linear = body.linvel();
        Some(BodySnapshot {
            position: Vec2::new(translation.x, translation.y),
            angle: body.rotation().angle(),
            linear: Vec2::new(linear.x, linear.y),
            angular: body.angvel(),
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
