use rapier2d::prelude::*;

use crate::config::{SpriteSizes, WindowConfig};
use crate::registry::ObjectRegistry;
use crate::render::Sprite;
use crate::world::SimulationWorld;

/// Everything a factory needs to assemble bodies: the world that owns them,
/// the registry that draws them, and the sizes of the art they must match.
pub struct BuildContext<'a> {
    pub world: &'a mut SimulationWorld,
    pub registry: &'a mut ObjectRegistry,
    pub sprites: &'a SpriteSizes,
    pub window: &'a WindowConfig,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        world: &'a mut SimulationWorld,
        registry: &'a mut ObjectRegistry,
        sprites: &'a SpriteSizes,
        window: &'a WindowConfig,
    ) -> Self {
        Self {
            world,
            registry,
            sprites,
            window,
        }
    }

    /// Inserts `body` with its colliders and registers it for drawing as `sprite`.
    pub fn spawn(
        &mut self,
        sprite: Sprite,
        body: RigidBody,
        colliders: impl IntoIterator<Item = Collider>,
    ) -> RigidBodyHandle {
        let handle = self.spawn_hidden(body, colliders);
        self.registry.create_entity(sprite, handle);
        handle
    }

    /// Inserts `body` with its colliders without giving it a visual.
    pub fn spawn_hidden(
        &mut self,
        body: RigidBody,
        colliders: impl IntoIterator<Item = Collider>,
    ) -> RigidBodyHandle {
        let handle = self.world.insert_body(body);
        for collider in colliders {
            self.world.insert_collider(collider, handle);
        }
        handle
    }

    pub fn size(&self, sprite: Sprite) -> [f32; 2] {
        self.sprites.size(sprite)
    }
}
