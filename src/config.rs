//! Configuration parsing and management for mocap-rig

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::avatar::Mirroring;
use crate::error::{ConfigError, MocapError};
use crate::retarget::basis::BasisLayout;
use crate::retarget::smoothing::DEFAULT_SMOOTHING;
use crate::tracking::Topology;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retarget: RetargetConfig,
    pub rig: RigConfig,
    /// Landmark counts the detector declares for each set
    pub topology: Topology,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MocapError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, MocapError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, MocapError> {
        let paths = [
            PathBuf::from("mocap-rig.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MocapError> {
        let r = &self.retarget;

        if !(r.smoothing > 0.0 && r.smoothing <= 1.0) {
            return Err(invalid(
                "retarget.smoothing",
                "Smoothing factor must be in (0.0, 1.0]",
            ));
        }

        if !(0.0..=1.0).contains(&r.visibility_threshold) {
            return Err(invalid(
                "retarget.visibility_threshold",
                "Visibility threshold must be between 0.0 and 1.0",
            ));
        }

        if r.frame_width == 0 || r.frame_height == 0 {
            return Err(invalid(
                "retarget.frame_width",
                "Frame dimensions must be greater than 0",
            ));
        }

        if !r.root_translation_scale.is_finite() {
            return Err(invalid(
                "retarget.root_translation_scale",
                "Root translation scale must be finite",
            ));
        }

        if !(r.degenerate_epsilon > 0.0 && r.degenerate_epsilon.is_finite()) {
            return Err(invalid(
                "retarget.degenerate_epsilon",
                "Degenerate epsilon must be a positive number",
            ));
        }

        if self.rig.head_mesh.is_empty() {
            return Err(invalid("rig.head_mesh", "Head mesh name must not be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> MocapError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Retargeting math tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Blend factor toward each new value (1.0 = no smoothing)
    pub smoothing: f32,
    /// Shoulder/hip visibility must exceed this for the body gates to open
    pub visibility_threshold: f32,
    /// Capture width in pixels; normalized landmarks are scaled by it
    pub frame_width: u32,
    /// Capture height in pixels
    pub frame_height: u32,
    /// Root x offset per unit of normalized hip displacement from frame center
    pub root_translation_scale: f32,
    /// Side mapping between the user and the avatar
    pub mirroring: Mirroring,
    /// Change-of-basis matrix layout for the body chains
    pub basis_layout: BasisLayout,
    /// Vectors shorter than this are treated as having no direction
    pub degenerate_epsilon: f32,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            visibility_threshold: default_visibility_threshold(),
            frame_width: 1920,
            frame_height: 1080,
            root_translation_scale: default_root_translation_scale(),
            mirroring: Mirroring::default(),
            basis_layout: BasisLayout::default(),
            degenerate_epsilon: default_degenerate_epsilon(),
        }
    }
}

fn default_smoothing() -> f32 {
    DEFAULT_SMOOTHING
}

fn default_visibility_threshold() -> f32 {
    0.9
}

fn default_root_translation_scale() -> f32 {
    -1000.0
}

fn default_degenerate_epsilon() -> f32 {
    1e-6
}

/// How canonical bone and mesh names resolve against the bound rig
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Mesh carrying the facial morph targets
    pub head_mesh: String,
    /// Mesh carrying the jaw morph target for the teeth
    pub teeth_mesh: String,
    /// Canonical bone name → rig bone name, for rigs with non-standard naming
    pub bone_aliases: HashMap<String, String>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            head_mesh: "Wolf3D_Head".to_string(),
            teeth_mesh: "Wolf3D_Teeth".to_string(),
            bone_aliases: HashMap::new(),
        }
    }
}

impl RigConfig {
    /// Rig name to look up for a canonical bone name.
    pub fn resolve<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.bone_aliases
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("mocap-rig");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/mocap-rig");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/mocap-rig");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mocap-rig");
        }
    }

    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retarget.smoothing, DEFAULT_SMOOTHING);
        assert_eq!(DEFAULT_SMOOTHING, 0.25);
        assert_eq!(config.retarget.visibility_threshold, 0.9);
        assert_eq!(config.retarget.frame_width, 1920);
        assert_eq!(config.retarget.mirroring, Mirroring::Mirrored);
        assert_eq!(config.retarget.basis_layout, BasisLayout::Columns);
        assert_eq!(config.rig.head_mesh, "Wolf3D_Head");
        assert_eq!(config.topology, Topology::EXPECTED);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad = Config::default();
        bad.retarget.smoothing = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = Config::default();
        bad.retarget.visibility_threshold = 1.5;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [retarget]
            smoothing = 0.5
            mirroring = "direct"
            basis_layout = "permuted"

            [rig]
            teeth_mesh = "Teeth"

            [rig.bone_aliases]
            Spine = "mixamorig:Spine"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.retarget.smoothing, 0.5);
        assert_eq!(config.retarget.visibility_threshold, 0.9);
        assert_eq!(config.retarget.mirroring, Mirroring::Direct);
        assert_eq!(config.retarget.basis_layout, BasisLayout::Permuted);
        assert_eq!(config.rig.teeth_mesh, "Teeth");
        assert_eq!(config.rig.head_mesh, "Wolf3D_Head");
        assert_eq!(config.rig.resolve("Spine"), "mixamorig:Spine");
        assert_eq!(config.rig.resolve("Neck"), "Neck");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::from_str("[retarget]\nsmoothing = \"fast\"");
        assert!(matches!(
            result,
            Err(MocapError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mocap-rig.toml");
        std::fs::write(&path, "[topology]\nface = 478\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.topology.face, 478);
        assert_eq!(config.topology.pose, 33);

        let missing = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            missing,
            Err(MocapError::Config(ConfigError::ReadFile(_)))
        ));
    }
}
