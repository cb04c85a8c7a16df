//! Registry of drawable entities and rope connectors.
//!
//! The registry binds every simulation body that has a visual to an
//! [`Entity`], keeps the rope connectors that render lines between bodies,
//! and owns the static world boundary. Entities and connectors only hold
//! body handles; the bodies themselves belong to the [`SimulationWorld`], so
//! the registry must be cleared before that world is discarded.

use std::collections::HashMap;

use rapier2d::prelude::*;
use tracing::{debug, warn};

use crate::physics::{to_render, to_render_vec, GROUP_WORLD, exclusive_group};
use crate::render::{DrawMode, Renderer, Sprite};
use crate::world::SimulationWorld;

/// Index of an entity in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(usize);

/// A visual kind paired with the body that positions it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub sprite: Sprite,
    pub body: RigidBodyHandle,
}

impl Entity {
    pub fn draw(&self, world: &SimulationWorld, renderer: &mut dyn Renderer, mode: DrawMode) {
        let Some(body) = world.body(self.body) else {
            return;
        };
        let position = to_render_vec(*body.translation());
        let angle = body.rotation().angle();
        if mode.includes_sprites() {
            renderer.draw_sprite(self.sprite, position, angle);
        }
        if mode.includes_lines() {
            renderer.draw_outline(self.sprite, position, angle);
        }
    }
}

/// One end of a rope connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RopeEnd {
    pub body: RigidBodyHandle,
    /// Offset from the body origin in simulation units.
    pub offset: Vector<Real>,
    /// Whether the offset turns with the body.
    pub rotates: bool,
}

impl RopeEnd {
    pub fn new(body: RigidBodyHandle, offset: Vector<Real>, rotates: bool) -> Self {
        Self { body, offset, rotates }
    }

    /// World position of this end in simulation units.
    pub fn world_point(&self, world: &SimulationWorld) -> Option<Vector<Real>> {
        let body = world.body(self.body)?;
        let offset = if self.rotates {
            body.rotation() * self.offset
        } else {
            self.offset
        };
        Some(body.translation() + offset)
    }
}

/// A straight line between anchors on two bodies, recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RopeConnector {
    pub ends: [RopeEnd; 2],
}

impl RopeConnector {
    /// Endpoints in render units, or `None` if either body is gone.
    pub fn endpoints(&self, world: &SimulationWorld) -> Option<([f32; 2], [f32; 2])> {
        let a = self.ends[0].world_point(world)?;
        let b = self.ends[1].world_point(world)?;
        Some((to_render_vec(a), to_render_vec(b)))
    }

    pub fn draw(&self, world: &SimulationWorld, renderer: &mut dyn Renderer) {
        if let Some((a, b)) = self.endpoints(world) {
            renderer.draw_line(Sprite::Pulleyline, a, b);
        }
    }
}

pub struct ObjectRegistry {
    entities: Vec<Entity>,
    ropes: Vec<RopeConnector>,
    owners: HashMap<RigidBodyHandle, EntityId>,
    boundary: Option<RigidBodyHandle>,
    window_center: [f32; 2],
}

impl ObjectRegistry {
    pub fn new(window_center: [f32; 2]) -> Self {
        Self {
            entities: Vec::new(),
            ropes: Vec::new(),
            owners: HashMap::new(),
            boundary: None,
            window_center,
        }
    }

    /// Registers a drawable entity for `body` and records the back-reference
    /// used by contact lookups.
    pub fn create_entity(&mut self, sprite: Sprite, body: RigidBodyHandle) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities.push(Entity { sprite, body });
        self.owners.insert(body, id);
        debug!(?sprite, ?body, "registered entity");
        id
    }

    pub fn create_rope_connector(
        &mut self,
        body0: RigidBodyHandle,
        offset0: Vector<Real>,
        rotates0: bool,
        body1: RigidBodyHandle,
        offset1: Vector<Real>,
        rotates1: bool,
    ) -> &RopeConnector {
        self.ropes.push(RopeConnector {
            ends: [
                RopeEnd::new(body0, offset0, rotates0),
                RopeEnd::new(body1, offset1, rotates1),
            ],
        });
        debug!(?body0, ?body1, "registered rope connector");
        &self.ropes[self.ropes.len() - 1]
    }

    /// Drops every entity, connector and back-reference. Safe to call on an
    /// empty registry.
    pub fn clear(&mut self) {
        if !self.entities.is_empty() || !self.ropes.is_empty() {
            debug!(
                entities = self.entities.len(),
                ropes = self.ropes.len(),
                "clearing registry"
            );
        }
        self.entities.clear();
        self.ropes.clear();
        self.owners.clear();
        self.boundary = None;
    }

    /// Draws background, then connectors, then entities, each in
    /// registration order.
    pub fn draw(&self, world: &SimulationWorld, renderer: &mut dyn Renderer, mode: DrawMode) {
        if mode.includes_sprites() {
            renderer.draw_sprite(Sprite::Background, self.window_center, 0.0);
        }
        for rope in &self.ropes {
            rope.draw(world, renderer);
        }
        for entity in &self.entities {
            entity.draw(world, renderer, mode);
        }
    }

    /// Creates the bottom, left and right edges of the world on one static
    /// body. `width` and `height` are in simulation units. There is no top.
    pub fn create_world_boundary(
        &mut self,
        world: &mut SimulationWorld,
        width: Real,
        height: Real,
    ) -> RigidBodyHandle {
        if let Some(existing) = self.boundary {
            warn!("world boundary already exists; ignoring");
            return existing;
        }

        let body = world.insert_body(RigidBodyBuilder::fixed().build());
        let edges = [
            (point![0.0, 0.0], point![width, 0.0]),
            (point![0.0, 0.0], point![0.0, height]),
            (point![width, 0.0], point![width, height]),
        ];
        for (a, b) in edges {
            world.insert_collider(
                ColliderBuilder::segment(a, b)
                    .friction(0.9)
                    .collision_groups(exclusive_group(GROUP_WORLD))
                    .build(),
                body,
            );
        }
        debug!(
            width = to_render(width),
            height = to_render(height),
            "created world boundary"
        );
        self.boundary = Some(body);
        body
    }

    pub fn boundary(&self) -> Option<RigidBodyHandle> {
        self.boundary
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ropes(&self) -> &[RopeConnector] {
        &self.ropes
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    /// Looks up the entity bound to `body`.
    pub fn entity_for(&self, body: RigidBodyHandle) -> Option<&Entity> {
        self.owners.get(&body).and_then(|id| self.entity(*id))
    }

    pub fn sprite_of(&self, body: RigidBodyHandle) -> Option<Sprite> {
        self.entity_for(body).map(|entity| entity.sprite)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.ropes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PhysicsConfig};
    use crate::context::BuildContext;
    use crate::obstacles::create_ball;
    use crate::test_support::{DrawCall, RecordingRenderer};

    fn world() -> SimulationWorld {
        SimulationWorld::new(&PhysicsConfig::default())
    }

    fn body_at(world: &mut SimulationWorld, x: Real, y: Real, angle: Real) -> RigidBodyHandle {
        world.insert_body(
            RigidBodyBuilder::dynamic()
                .translation(vector![x, y])
                .rotation(angle)
                .build(),
        )
    }

    #[test]
    fn test_fast_ball_does_not_tunnel_through_the_floor() {
        let config = GameConfig::default();
        let mut world = SimulationWorld::new(&config.physics);
        let mut registry = ObjectRegistry::new(config.window.center());
        registry.create_world_boundary(&mut world, 102.4, 76.8);
        let ball = {
            let mut ctx = BuildContext::new(&mut world, &mut registry, &config.sprites, &config.window);
            create_ball(&mut ctx, 500.0, 200.0)
        };
        // 25 units per step against a ball of radius 1.2.
        world.body_mut(ball).unwrap().set_linvel(vector![0.0, -1500.0], true);
        for _ in 0..30 {
            world.step();
        }
        let y = world.body(ball).unwrap().translation().y;
        assert!(y > 0.0, "ball ended below the floor at {y}");
    }

    #[test]
    fn test_entity_back_reference() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let body = body_at(&mut world, 1.0, 1.0, 0.0);
        let id = registry.create_entity(Sprite::Ball, body);
        assert_eq!(registry.entity(id).map(|e| e.sprite), Some(Sprite::Ball));
        assert_eq!(registry.sprite_of(body), Some(Sprite::Ball));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let a = body_at(&mut world, 1.0, 1.0, 0.0);
        let b = body_at(&mut world, 2.0, 1.0, 0.0);
        registry.create_entity(Sprite::Basket, a);
        registry.create_rope_connector(a, Vector::zeros(), false, b, Vector::zeros(), false);

        registry.clear();
        assert!(registry.entities().is_empty());
        assert!(registry.ropes().is_empty());
        assert!(registry.sprite_of(a).is_none());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_registry_draws_only_background() {
        let world = world();
        let registry = ObjectRegistry::new([512.0, 384.0]);

        let mut renderer = RecordingRenderer::default();
        registry.draw(&world, &mut renderer, DrawMode::Sprites);
        assert_eq!(
            renderer.calls,
            vec![DrawCall::Sprite(Sprite::Background, [512.0, 384.0], 0.0)]
        );

        let mut renderer = RecordingRenderer::default();
        registry.draw(&world, &mut renderer, DrawMode::Lines);
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn test_connectors_draw_before_entities() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let a = body_at(&mut world, 1.0, 1.0, 0.0);
        let b = body_at(&mut world, 3.0, 1.0, 0.0);
        registry.create_rope_connector(a, Vector::zeros(), false, b, Vector::zeros(), false);
        registry.create_entity(Sprite::Basket, a);
        // Entities registered later still draw after every connector.
        registry.create_entity(Sprite::Wheel, b);

        let mut renderer = RecordingRenderer::default();
        registry.draw(&world, &mut renderer, DrawMode::Both);

        let kinds: Vec<&str> = renderer
            .calls
            .iter()
            .map(|call| match call {
                DrawCall::Sprite(Sprite::Background, ..) => "background",
                DrawCall::Line(..) => "line",
                DrawCall::Sprite(..) => "sprite",
                DrawCall::Outline(..) => "outline",
                DrawCall::Text(..) | DrawCall::CenteredText(..) => "text",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["background", "line", "sprite", "outline", "sprite", "outline"]
        );
    }

    #[test]
    fn test_missing_bodies_are_skipped() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let mut other = SimulationWorld::new(&PhysicsConfig::default());
        other.insert_body(RigidBodyBuilder::dynamic().build());
        let stranger = other.insert_body(RigidBodyBuilder::dynamic().build());
        let known = body_at(&mut world, 1.0, 1.0, 0.0);

        registry.create_entity(Sprite::Ball, stranger);
        registry.create_rope_connector(known, Vector::zeros(), false, stranger, Vector::zeros(), false);

        let mut renderer = RecordingRenderer::default();
        registry.draw(&world, &mut renderer, DrawMode::Lines);
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn test_rope_endpoint_rotation() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let turned = body_at(&mut world, 1.0, 2.0, std::f32::consts::FRAC_PI_2);
        let rope = *registry.create_rope_connector(
            turned,
            vector![1.0, 0.0],
            true,
            turned,
            vector![1.0, 0.0],
            false,
        );

        let (a, b) = rope.endpoints(&world).expect("body exists");
        assert!((a[0] - 10.0).abs() < 1e-3 && (a[1] - 30.0).abs() < 1e-3, "{a:?}");
        assert!((b[0] - 20.0).abs() < 1e-3 && (b[1] - 20.0).abs() < 1e-3, "{b:?}");
    }

    #[test]
    fn test_world_boundary_has_three_edges() {
        let mut world = world();
        let mut registry = ObjectRegistry::new([512.0, 384.0]);
        let boundary = registry.create_world_boundary(&mut world, 102.4, 76.8);
        assert_eq!(world.colliders_of(boundary), 3);
        assert!(world.body(boundary).unwrap().is_fixed());

        // A second call reuses the existing boundary.
        let again = registry.create_world_boundary(&mut world, 102.4, 76.8);
        assert_eq!(again, boundary);
        assert_eq!(world.body_count(), 1);

        registry.clear();
        assert!(registry.boundary().is_none());
    }
}
