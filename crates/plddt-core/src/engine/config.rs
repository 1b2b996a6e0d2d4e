use crate::core::confidence::{
    BinThresholds, BoundaryRule, DEFAULT_CATALYTIC_CUTOFF, DEFAULT_THRESHOLDS, ThresholdError,
};
use crate::core::palette::Palette;
use thiserror::Error;

pub const DEFAULT_SCOPE: &str = "all";
pub const DEFAULT_MARKER_ATOM: &str = "CA";
pub const DEFAULT_TEMP_PREFIX: &str = "plddt";
pub const DEFAULT_SPHERE_SCALE: f64 = 0.6;
pub const DEFAULT_SURFACE_TRANSPARENCY: f64 = 0.5;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Scope expression cannot be empty")]
    EmptyScope,
    #[error("Invalid {field} '{value}': use letters, digits and underscores only")]
    InvalidName { field: &'static str, value: String },
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
    #[error("Catalytic cutoff must be finite, got {0}")]
    NonFiniteCutoff(f64),
    #[error("Surface transparency must lie in [0, 1], got {0}")]
    InvalidTransparency(f64),
    #[error("Sphere scale must be positive and finite, got {0}")]
    InvalidSphereScale(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalyticConfig {
    pub cutoff: f64,
    pub show_spheres: bool,
    pub sphere_scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub enabled: bool,
    pub transparency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorConfig {
    pub scope: String,
    pub marker_atom: String,
    pub thresholds: BinThresholds,
    pub rule: BoundaryRule,
    pub catalytic: CatalyticConfig,
    pub surface: SurfaceConfig,
    pub palette: Palette,
    /// Prefix of every temporary selection, object and color name a pass creates.
    pub temp_prefix: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            marker_atom: DEFAULT_MARKER_ATOM.to_string(),
            thresholds: BinThresholds::default(),
            rule: BoundaryRule::default(),
            catalytic: CatalyticConfig {
                cutoff: DEFAULT_CATALYTIC_CUTOFF,
                show_spheres: true,
                sphere_scale: DEFAULT_SPHERE_SCALE,
            },
            surface: SurfaceConfig {
                enabled: false,
                transparency: DEFAULT_SURFACE_TRANSPARENCY,
            },
            palette: Palette::default(),
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ColorConfig {
    /// Checks the invariants `ColorConfigBuilder::build` enforces; configs
    /// assembled field by field are re-checked before each pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scope.trim().is_empty() {
            return Err(ConfigError::EmptyScope);
        }
        if !is_identifier(&self.marker_atom) {
            return Err(ConfigError::InvalidName {
                field: "marker atom",
                value: self.marker_atom.clone(),
            });
        }
        if !is_identifier(&self.temp_prefix) {
            return Err(ConfigError::InvalidName {
                field: "temporary name prefix",
                value: self.temp_prefix.clone(),
            });
        }
        BinThresholds::new(self.thresholds.values())?;
        if !self.catalytic.cutoff.is_finite() {
            return Err(ConfigError::NonFiniteCutoff(self.catalytic.cutoff));
        }
        let scale = self.catalytic.sphere_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidSphereScale(scale));
        }
        let t = self.surface.transparency;
        if !(0.0..=1.0).contains(&t) {
            return Err(ConfigError::InvalidTransparency(t));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ColorConfigBuilder {
    scope: Option<String>,
    marker_atom: Option<String>,
    thresholds: Option<[f64; 3]>,
    rule: Option<BoundaryRule>,
    cutoff: Option<f64>,
    show_spheres: Option<bool>,
    sphere_scale: Option<f64>,
    surface: Option<bool>,
    surface_transparency: Option<f64>,
    palette: Option<Palette>,
    temp_prefix: Option<String>,
}

impl ColorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }
    pub fn marker_atom(mut self, name: &str) -> Self {
        self.marker_atom = Some(name.to_string());
        self
    }
    pub fn thresholds(mut self, thresholds: [f64; 3]) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
    pub fn rule(mut self, rule: BoundaryRule) -> Self {
        self.rule = Some(rule);
        self
    }
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn show_spheres(mut self, enabled: bool) -> Self {
        self.show_spheres = Some(enabled);
        self
    }
    pub fn sphere_scale(mut self, scale: f64) -> Self {
        self.sphere_scale = Some(scale);
        self
    }
    pub fn surface(mut self, enabled: bool) -> Self {
        self.surface = Some(enabled);
        self
    }
    pub fn surface_transparency(mut self, transparency: f64) -> Self {
        self.surface_transparency = Some(transparency);
        self
    }
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }
    pub fn temp_prefix(mut self, prefix: &str) -> Self {
        self.temp_prefix = Some(prefix.to_string());
        self
    }

    pub fn build(self) -> Result<ColorConfig, ConfigError> {
        let defaults = ColorConfig::default();
        let config = ColorConfig {
            scope: self.scope.unwrap_or(defaults.scope).trim().to_string(),
            marker_atom: self.marker_atom.unwrap_or(defaults.marker_atom),
            thresholds: BinThresholds::new(self.thresholds.unwrap_or(DEFAULT_THRESHOLDS))?,
            rule: self.rule.unwrap_or(defaults.rule),
            catalytic: CatalyticConfig {
                cutoff: self.cutoff.unwrap_or(defaults.catalytic.cutoff),
                show_spheres: self.show_spheres.unwrap_or(defaults.catalytic.show_spheres),
                sphere_scale: self.sphere_scale.unwrap_or(defaults.catalytic.sphere_scale),
            },
            surface: SurfaceConfig {
                enabled: self.surface.unwrap_or(defaults.surface.enabled),
                transparency: self
                    .surface_transparency
                    .unwrap_or(defaults.surface.transparency),
            },
            palette: self.palette.unwrap_or(defaults.palette),
            temp_prefix: self.temp_prefix.unwrap_or(defaults.temp_prefix),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default_config() {
        let built = ColorConfigBuilder::new().build().unwrap();
        assert_eq!(built, ColorConfig::default());
        assert_eq!(built.scope, "all");
        assert_eq!(built.catalytic.cutoff, 9.0);
        assert_eq!(built.rule, BoundaryRule::UpperInclusive);
        assert!(!built.surface.enabled);
    }

    #[test]
    fn builder_applies_overrides() {
        let config = ColorConfigBuilder::new()
            .scope(" chain A ")
            .cutoff(5.5)
            .rule(BoundaryRule::LowerInclusive)
            .surface(true)
            .surface_transparency(0.25)
            .thresholds([40.0, 60.0, 80.0])
            .build()
            .unwrap();
        assert_eq!(config.scope, "chain A");
        assert_eq!(config.catalytic.cutoff, 5.5);
        assert_eq!(config.rule, BoundaryRule::LowerInclusive);
        assert!(config.surface.enabled);
        assert_eq!(config.surface.transparency, 0.25);
        assert_eq!(config.thresholds.values(), [40.0, 60.0, 80.0]);
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert_eq!(
            ColorConfigBuilder::new().scope("  ").build(),
            Err(ConfigError::EmptyScope)
        );
        assert!(matches!(
            ColorConfigBuilder::new().thresholds([90.0, 70.0, 50.0]).build(),
            Err(ConfigError::Thresholds(ThresholdError::NotAscending(_)))
        ));
        assert!(matches!(
            ColorConfigBuilder::new().cutoff(f64::NAN).build(),
            Err(ConfigError::NonFiniteCutoff(_))
        ));
        assert_eq!(
            ColorConfigBuilder::new().surface_transparency(1.5).build(),
            Err(ConfigError::InvalidTransparency(1.5))
        );
        assert_eq!(
            ColorConfigBuilder::new().sphere_scale(0.0).build(),
            Err(ConfigError::InvalidSphereScale(0.0))
        );
        assert!(matches!(
            ColorConfigBuilder::new().temp_prefix("my tmp").build(),
            Err(ConfigError::InvalidName { .. })
        ));
        assert!(matches!(
            ColorConfigBuilder::new().marker_atom("").build(),
            Err(ConfigError::InvalidName { .. })
        ));
    }
}
