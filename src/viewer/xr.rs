use glam::{Quat, Vec3};

use crate::scene::picking::Ray;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XrCapability {
    Supported,
    Unsupported(String),
}

impl XrCapability {
    pub fn is_supported(&self) -> bool {
        matches!(self, XrCapability::Supported)
    }
}

/// Platform XR runtime, asked before entering AR mode.
pub trait XrRuntime {
    fn immersive_ar_support(&self) -> XrCapability;
}

/// Desktop builds have no XR session provider.
#[derive(Debug, Default)]
pub struct NativeXr;

impl XrRuntime for NativeXr {
    fn immersive_ar_support(&self) -> XrCapability {
        XrCapability::Unsupported("Immersive AR is not available on this device; showing the 3D view instead.".to_string())
    }
}

/// Previews AR on a flat screen: table-scale layout, reticle and the AR
/// gesture mapping, without a passthrough camera.
#[derive(Debug, Default)]
pub struct SimulatedXr;

impl XrRuntime for SimulatedXr {
    fn immersive_ar_support(&self) -> XrCapability {
        XrCapability::Supported
    }
}

/// Pose of a tracked controller at the moment its select button fired.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ControllerSelect {
    pub position: Vec3,
    pub orientation: Quat,
}

impl ControllerSelect {
    /// Controllers point down their local -Z axis.
    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.orientation * Vec3::NEG_Z)
    }
}
