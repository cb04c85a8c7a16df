//! Turns raw body contacts into gameplay signals.

use crate::registry::ObjectRegistry;
use crate::render::Sprite;
use crate::world::BodyContact;

/// What a started contact means for the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSignal {
    /// A rolling body reached the catapult.
    TriggerCatapult,
    /// Something touched the pig.
    HitButton,
}

fn is_missile(sprite: Sprite) -> bool {
    matches!(sprite, Sprite::Ball | Sprite::Heavyball | Sprite::Bird)
}

fn is_catapult_part(sprite: Sprite) -> bool {
    matches!(sprite, Sprite::Base | Sprite::Catapult | Sprite::Wheel)
}

/// Classifies a contact between two visual kinds. `None` stands for a body
/// with no visual, such as the world boundary.
pub fn classify(a: Option<Sprite>, b: Option<Sprite>) -> Option<ContactSignal> {
    if a == Some(Sprite::Pig) || b == Some(Sprite::Pig) {
        return Some(ContactSignal::HitButton);
    }
    let (a, b) = (a?, b?);
    if (is_missile(a) && is_catapult_part(b)) || (is_missile(b) && is_catapult_part(a)) {
        return Some(ContactSignal::TriggerCatapult);
    }
    None
}

/// Signals raised by the contacts that started during a step, in order.
pub fn signals(registry: &ObjectRegistry, contacts: &[BodyContact]) -> Vec<ContactSignal> {
    contacts
        .iter()
        .filter(|contact| contact.started)
        .filter_map(|contact| {
            classify(
                registry.sprite_of(contact.body1),
                registry.sprite_of(contact.body2),
            )
        })
        .collect()
}
