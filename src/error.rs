/// Error taxonomy for the sandbox core
///
/// None of these are fatal to a running session. The worst outcome of any of
/// them is an ignored click.

use thiserror::Error;

use crate::material::Material;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
    /// Material id not present in the catalog (unparseable name, or a
    /// catalog file that left one out)
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    /// Pointer ray did not intersect any registered body
    #[error("Pointer ray hit no surface")]
    NoSurfaceHit,

    /// Force/radius entry field did not parse as a number
    #[error("Invalid numeric input in {field}: {raw:?}")]
    InvalidNumericInput { field: &'static str, raw: String },

    /// Body handle used after its body was removed from the registry
    #[error("Stale body handle: {0:?}")]
    StaleHandle(hecs::Entity),
}

impl SandboxError {
    pub fn unknown_material(material: Material) -> Self {
        Self::UnknownMaterial(material.name().to_string())
    }
}

pub type Result<T> = std::result::Result<T, SandboxError>;
