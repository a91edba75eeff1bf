/// Interaction mode state machine
///
/// Decides what a pointer click does and whether the earthquake is running.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interaction mode - exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Clicks place blocks
    #[default]
    Building,
    /// Clicks detonate an explosion
    Explosion,
    /// Shaking; clicks are ignored until it ends
    Earthquake,
}

impl InteractionMode {
    pub fn name(self) -> &'static str {
        match self {
            InteractionMode::Building => "Building",
            InteractionMode::Explosion => "Explosion",
            InteractionMode::Earthquake => "Earthquake",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a click should do in the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Place,
    Explode,
    Ignore,
}

#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: InteractionMode,
    /// Force/radius entry fields are shown
    explosion_fields_visible: bool,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn explosion_fields_visible(&self) -> bool {
        self.explosion_fields_visible
    }

    pub fn click_action(&self) -> ClickAction {
        match self.mode {
            InteractionMode::Building => ClickAction::Place,
            InteractionMode::Explosion => ClickAction::Explode,
            InteractionMode::Earthquake => ClickAction::Ignore,
        }
    }

    /// Building <-> Explosion; ignored during an earthquake
    pub fn toggle_explosion(&mut self) -> InteractionMode {
        match self.mode {
            InteractionMode::Building => self.transition(InteractionMode::Explosion),
            InteractionMode::Explosion => self.transition(InteractionMode::Building),
            InteractionMode::Earthquake => {
                tracing::debug!("Explosion toggle ignored during earthquake");
            }
        }
        self.mode
    }

    /// Enter Earthquake; only allowed from Building
    pub fn start_earthquake(&mut self) -> bool {
        if self.mode != InteractionMode::Building {
            tracing::debug!(mode = %self.mode, "Earthquake can only start from Building");
            return false;
        }
        self.transition(InteractionMode::Earthquake);
        true
    }

    /// The earthquake job expired
    pub fn finish_earthquake(&mut self) {
        if self.mode == InteractionMode::Earthquake {
            self.transition(InteractionMode::Building);
        }
    }

    /// An explosion click went off
    pub fn explosion_fired(&mut self) {
        if self.mode == InteractionMode::Explosion {
            self.transition(InteractionMode::Building);
        }
    }

    fn transition(&mut self, next: InteractionMode) {
        tracing::info!(from = %self.mode, to = %next, "mode change");
        self.mode = next;
        self.explosion_fields_visible = next == InteractionMode::Explosion;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explosion_toggle() {
        let mut modes = ModeMachine::new();
        assert_eq!(modes.mode(), InteractionMode::Building);
        assert!(!modes.explosion_fields_visible());

        assert_eq!(modes.toggle_explosion(), InteractionMode::Explosion);
        assert!(modes.explosion_fields_visible());
        assert_eq!(modes.click_action(), ClickAction::Explode);

        assert_eq!(modes.toggle_explosion(), InteractionMode::Building);
        assert!(!modes.explosion_fields_visible());
    }

    #[test]
    fn test_fired_explosion_returns_to_building() {
        let mut modes = ModeMachine::new();
        modes.toggle_explosion();
        modes.explosion_fired();
        assert_eq!(modes.mode(), InteractionMode::Building);
        assert!(!modes.explosion_fields_visible());
    }

    #[test]
    fn test_earthquake_only_from_building() {
        let mut modes = ModeMachine::new();
        modes.toggle_explosion();
        assert!(!modes.start_earthquake());
        assert_eq!(modes.mode(), InteractionMode::Explosion);

        modes.toggle_explosion();
        assert!(modes.start_earthquake());
        assert_eq!(modes.click_action(), ClickAction::Ignore);

        // Not exitable early
        assert_eq!(modes.toggle_explosion(), InteractionMode::Earthquake);
        assert!(!modes.start_earthquake());
        modes.explosion_fired();
        assert_eq!(modes.mode(), InteractionMode::Earthquake);

        modes.finish_earthquake();
        assert_eq!(modes.mode(), InteractionMode::Building);
    }
}
