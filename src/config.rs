use anyhow::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::material::MaterialCatalog;

/// Complete sandbox configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub camera: CameraConfigData,
    pub physics: PhysicsConfigData,
    pub placement: PlacementConfigData,
    pub destruction: DestructionConfigData,
    pub materials: MaterialCatalog,
}

impl SandboxConfig {
    /// Load configuration from JSON file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SandboxConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file with pretty formatting
    pub fn save(&self, path: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            tracing::info!("No usable config at {} ({}), writing defaults", path, err);
            let config = Self::default();
            if let Err(err) = config.save(path) {
                tracing::warn!("Could not save default config to {}: {}", path, err);
            }
            config
        })
    }
}

/// Camera configuration (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfigData {
    #[serde(with = "vec3_serde")]
    pub position: Vec3,

    /// Heading in degrees, 0 looks down +Y
    pub heading: f32,
    /// Pitch in degrees, positive looks up
    pub pitch: f32,
    pub move_speed: f32,
    pub look_sensitivity: f32,
    pub fov: f32,
}

impl Default for CameraConfigData {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -20.0, 8.0),
            heading: 0.0,
            pitch: -15.0,
            move_speed: 10.0,
            look_sensitivity: 0.15,
            fov: 60.0,
        }
    }
}

/// Physics stepping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfigData {
    #[serde(with = "vec3_serde")]
    pub gravity: Vec3,

    /// Fixed internal timestep in seconds
    pub timestep: f32,
    /// Upper bound on substeps taken for a single frame
    pub max_substeps: u32,
    /// Physics starts enabled
    pub start_enabled: bool,
}

impl Default for PhysicsConfigData {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, 0.0, -9.81),
            timestep: 1.0 / 60.0,
            max_substeps: 8,
            start_enabled: false,
        }
    }
}

/// Block placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfigData {
    pub min_size: f32,
    pub max_size: f32,
    pub default_size: f32,
    /// Size change per keyboard step
    pub size_step: f32,
    /// Hit points are pulled back along the ray by this much before snapping
    pub surface_offset: f32,
    /// Continuous collision detection for placed blocks
    pub ccd_enabled: bool,
    /// Soft-CCD look-ahead distance for placed blocks
    pub soft_ccd_prediction: f32,
    /// Half extent of the drawn ground square; the ground collides everywhere
    pub ground_half_extent: f32,
}

impl Default for PlacementConfigData {
    fn default() -> Self {
        Self {
            min_size: 0.5,
            max_size: 3.0,
            default_size: 1.0,
            size_step: 0.25,
            surface_offset: 1e-3,
            ccd_enabled: true,
            soft_ccd_prediction: 0.5,
            ground_half_extent: 50.0,
        }
    }
}

/// Named destruction preset, fills the explosion force field when selected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructionPreset {
    pub name: String,
    pub force: f32,
}

/// Destruction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructionConfigData {
    pub default_explosion_force: f32,
    pub default_explosion_radius: f32,
    /// Added to the distance before dividing the explosion force
    pub explosion_distance_damping: f32,

    pub earthquake_duration: f32,
    pub earthquake_magnitude: f32,
    /// Fixed seed for reproducible earthquakes; random when absent
    pub earthquake_seed: Option<u64>,

    pub wrecking_ball: WreckingBallConfig,
    pub heavy_ball: HeavyBallConfig,
    pub presets: Vec<DestructionPreset>,
}

impl Default for DestructionConfigData {
    fn default() -> Self {
        Self {
            default_explosion_force: 100.0,
            default_explosion_radius: 5.0,
            explosion_distance_damping: 0.1,
            earthquake_duration: 5.0,
            earthquake_magnitude: 10.0,
            earthquake_seed: None,
            wrecking_ball: WreckingBallConfig::default(),
            heavy_ball: HeavyBallConfig::default(),
            presets: vec![
                DestructionPreset {
                    name: "Wrecking Ball".to_string(),
                    force: 100_000.0,
                },
                DestructionPreset {
                    name: "Explosive".to_string(),
                    force: 500_000.0,
                },
            ],
        }
    }
}

/// Wrecking ball rig
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WreckingBallConfig {
    pub mass: f32,
    pub radius: f32,
    pub friction: f32,
    pub restitution: f32,
    pub damping: f32,

    #[serde(with = "vec3_serde")]
    pub ball_position: Vec3,

    #[serde(with = "vec3_serde")]
    pub anchor_position: Vec3,

    pub anchor_half_extent: f32,

    /// Joint pivot in the ball's local frame
    #[serde(with = "vec3_serde")]
    pub ball_pivot: Vec3,

    #[serde(with = "vec3_serde")]
    pub initial_impulse: Vec3,
}

impl Default for WreckingBallConfig {
    fn default() -> Self {
        Self {
            mass: 50.0,
            radius: 2.0,
            friction: 0.5,
            restitution: 0.2,
            damping: 0.1,
            ball_position: Vec3::new(0.0, 0.0, 3.0),
            anchor_position: Vec3::new(0.0, 0.0, 10.0),
            anchor_half_extent: 0.1,
            ball_pivot: Vec3::new(0.0, 0.0, -5.0),
            initial_impulse: Vec3::new(50.0, 0.0, 0.0),
        }
    }
}

/// Dropped heavy ball hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeavyBallConfig {
    pub mass: f32,
    pub radius: f32,
    pub friction: f32,
    pub restitution: f32,
    pub drop_height: f32,
}

impl Default for HeavyBallConfig {
    fn default() -> Self {
        Self {
            mass: 100.0,
            radius: 1.0,
            friction: 0.5,
            restitution: 0.6,
            drop_height: 10.0,
        }
    }
}

/// Custom serialization for Vec3
mod vec3_serde {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Vec3Data {
        x: f32,
        y: f32,
        z: f32,
    }

    pub fn serialize<S>(vec: &Vec3, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Vec3Data {
            x: vec.x,
            y: vec.y,
            z: vec.z,
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = Vec3Data::deserialize(deserializer)?;
        Ok(Vec3::new(data.x, data.y, data.z))
    }
}
