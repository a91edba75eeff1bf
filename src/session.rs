/// Session state driven by the UI: current block selection and the raw text
/// of the explosion entry fields. Lives only as long as the running sandbox.

use crate::config::{DestructionConfigData, DestructionPreset, PlacementConfigData};
use crate::error::SandboxError;
use crate::material::Material;
use crate::placement::{BlockShape, BlockTemplate};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub block_size: f32,
    pub shape: BlockShape,
    pub material: Material,
    /// Raw contents of the force entry field
    pub force_text: String,
    /// Raw contents of the radius entry field
    pub radius_text: String,
    /// Name of the last selected destruction preset
    pub preset: Option<String>,

    min_size: f32,
    max_size: f32,
}

impl SessionConfig {
    pub fn new(placement: &PlacementConfigData, destruction: &DestructionConfigData) -> Self {
        Self {
            block_size: placement
                .default_size
                .clamp(placement.min_size, placement.max_size),
            shape: BlockShape::default(),
            material: Material::default(),
            force_text: destruction.default_explosion_force.to_string(),
            radius_text: destruction.default_explosion_radius.to_string(),
            preset: None,
            min_size: placement.min_size,
            max_size: placement.max_size,
        }
    }

    pub fn template(&self) -> BlockTemplate {
        BlockTemplate {
            shape: self.shape,
            size: self.block_size,
            material: self.material,
        }
    }

    /// Set the block size, kept within the placement bounds
    pub fn set_block_size(&mut self, size: f32) {
        self.block_size = size.clamp(self.min_size, self.max_size);
    }

    pub fn adjust_block_size(&mut self, delta: f32) {
        self.set_block_size(self.block_size + delta);
    }

    pub fn select_shape(&mut self, shape: BlockShape) {
        if self.shape != shape {
            tracing::info!(%shape, "shape selected");
            self.shape = shape;
        }
    }

    pub fn select_material(&mut self, material: Material) {
        if self.material != material {
            tracing::info!(%material, "material selected");
            self.material = material;
        }
    }

    /// Fill the force field from a named preset
    pub fn apply_preset(&mut self, preset: &DestructionPreset) {
        tracing::info!(preset = %preset.name, force = preset.force, "destruction preset selected");
        self.force_text = preset.force.to_string();
        self.preset = Some(preset.name.clone());
    }

    /// Force and radius from the entry fields; unparseable fields fall back
    /// to the configured defaults
    pub fn explosion_input(&self, defaults: &DestructionConfigData) -> (f32, f32) {
        let force = parse_field("force", &self.force_text, defaults.default_explosion_force);
        let radius = parse_field("radius", &self.radius_text, defaults.default_explosion_radius);
        (force, radius)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(&PlacementConfigData::default(), &DestructionConfigData::default())
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f32, SandboxError> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SandboxError::InvalidNumericInput {
            field,
            raw: raw.to_string(),
        })
}

fn parse_field(field: &'static str, raw: &str, default: f32) -> f32 {
    parse_number(field, raw).unwrap_or_else(|err| {
        tracing::warn!("{}, using {}", err, default);
        default
    })
}
