//! Two-state signal guarding a segment

use super::types::{Light, LightId};

/// A traffic light. Colour changes only through [`TrafficLight::change`].
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    colour: Light,
}

impl TrafficLight {
    /// New lights start green
    pub fn new(id: LightId) -> Self {
        Self {
            id,
            colour: Light::Green,
        }
    }

    pub fn colour(&self) -> Light {
        self.colour
    }

    /// Flip the colour unconditionally
    pub fn change(&mut self) {
        self.colour = self.colour.toggled();
    }

    pub fn is_green(&self) -> bool {
        self.colour == Light::Green
    }

    pub fn is_red(&self) -> bool {
        self.colour == Light::Red
    }

    /// Always true: the colour is one of two enum variants
    pub fn verify(&self) -> bool {
        self.is_green() || self.is_red()
    }
}
