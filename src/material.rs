use crate::error::{Result, SandboxError};
use glam::Vec4;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Building materials a block can be made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Wood,
    Metal,
    Stone,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Wood, Material::Metal, Material::Stone];

    pub fn name(self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Metal => "metal",
            Material::Stone => "stone",
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Wood
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = SandboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wood" => Ok(Material::Wood),
            "metal" => Ok(Material::Metal),
            "stone" => Ok(Material::Stone),
            other => Err(SandboxError::UnknownMaterial(other.to_string())),
        }
    }
}

/// Per-material constants, before scaling by block size
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub material: Material,
    /// Mass per unit of block size
    pub base_mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub color: [f32; 4],
}

impl MaterialEntry {
    pub fn new(material: Material, base_mass: f32, friction: f32, restitution: f32, color: [f32; 4]) -> Self {
        Self {
            material,
            base_mass,
            friction,
            restitution,
            color,
        }
    }
}

/// Physical properties of one block, resolved for a concrete size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockPhysics {
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub color: Vec4,
}

/// Material catalog - read-only after startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCatalog {
    pub entries: Vec<MaterialEntry>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self {
            entries: vec![
                MaterialEntry::new(Material::Wood, 1.0, 0.5, 0.2, [0.65, 0.5, 0.39, 1.0]),
                MaterialEntry::new(Material::Metal, 5.0, 0.3, 0.1, [0.7, 0.7, 0.7, 1.0]),
                MaterialEntry::new(Material::Stone, 3.0, 0.7, 0.05, [0.5, 0.5, 0.5, 1.0]),
            ],
        }
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, material: Material) -> Option<&MaterialEntry> {
        self.entries.iter().find(|e| e.material == material)
    }

    pub fn contains(&self, material: Material) -> bool {
        self.get(material).is_some()
    }

    /// Resolve block properties; mass scales linearly with size
    pub fn properties(&self, material: Material, size: f32) -> Result<BlockPhysics> {
        let entry = self
            .get(material)
            .ok_or_else(|| SandboxError::unknown_material(material))?;

        Ok(BlockPhysics {
            mass: entry.base_mass * size,
            friction: entry.friction,
            restitution: entry.restitution,
            color: Vec4::from_array(entry.color),
        })
    }

    /// Same as `properties`, looking the material up by its name
    pub fn properties_by_name(&self, name: &str, size: f32) -> Result<BlockPhysics> {
        self.properties(name.parse()?, size)
    }
}
