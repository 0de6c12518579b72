//! Tray tuning
//!
//! Every tunable constant of the roller in one serde struct. Persisted to
//! LocalStorage on web; natively the defaults are used.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::{DieBodyParams, LaunchParams, PhysicsParams, Range3, SettleThresholds};
use crate::spinner::SpinnerTiming;

/// Roller settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraySettings {
    /// Settling detector thresholds
    pub settle: SettleThresholds,
    /// Tray materials and gravity
    pub physics: PhysicsParams,
    /// Launch randomization
    pub launch: LaunchParams,
    /// Die body shape and mass
    pub dice: DieBodyParams,
    /// 2D spinner cadence
    pub spinner: SpinnerTiming,
}

impl TraySettings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "d10_tray_settings";

    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values the detector or the physics cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settle = &self.settle;
        positive("settle.linear_speed", settle.linear_speed)?;
        positive("settle.angular_speed", settle.angular_speed)?;
        if settle.rest_frames == 0 {
            return Err(ConfigError::ZeroRestFrames);
        }
        if let Some(t) = settle.timeout_secs {
            positive("settle.timeout_secs", t)?;
        }

        let physics = &self.physics;
        positive("physics.tray_radius", physics.tray_radius)?;
        positive("physics.wall_height", physics.wall_height)?;

        let dice = &self.dice;
        positive("dice.radius", dice.radius)?;
        positive("dice.apex", dice.apex)?;
        positive("dice.mass_normal", dice.mass_normal)?;
        positive("dice.mass_distress", dice.mass_distress)?;

        let launch = &self.launch;
        ordered(
            "launch.spawn_height",
            launch.spawn_height_min,
            launch.spawn_height_max,
        )?;
        ordered3("launch.linvel", &launch.linvel)?;
        ordered3("launch.angvel", &launch.angvel)?;
        ordered3("launch.impulse", &launch.impulse)?;
        ordered3("launch.torque_impulse", &launch.torque_impulse)?;
        positive("launch.distress_spread", launch.distress_spread)?;
        if launch.spawn_radius < 0.0 || launch.spawn_radius >= physics.tray_radius {
            return Err(ConfigError::SpawnOutsideTray {
                spawn: launch.spawn_radius,
                tray: physics.tray_radius,
            });
        }

        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded tray settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored tray settings: {}", e),
                }
            }
        }

        log::info!("Using default tray settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Tray settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} store natively, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    // NaN fails this too
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

fn ordered3(field: &'static str, range: &Range3) -> Result<(), ConfigError> {
    ordered(field, range.min.x, range.max.x)?;
    ordered(field, range.min.y, range.max.y)?;
    ordered(field, range.min.z, range.max.z)
}
