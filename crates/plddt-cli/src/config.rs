use crate::cli::ColorArgs;
use crate::error::{CliError, Result};
use plddtpaint::core::confidence::BoundaryRule;
use plddtpaint::core::palette::{Color, Palette, Rgb};
use plddtpaint::engine::config::{self as core_config, ColorConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBinsConfig {
    thresholds: Option<[f64; 3]>,
    rule: Option<BoundaryRule>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCatalyticConfig {
    cutoff: Option<f64>,
    spheres: Option<bool>,
    sphere_scale: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSurfaceConfig {
    enabled: Option<bool>,
    transparency: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPaletteConfig {
    low: Option<Color>,
    mid: Option<Color>,
    high: Option<Color>,
    very_high: Option<Color>,
    catalytic: Option<Rgb>,
    patch: Option<Rgb>,
    acidic: Option<Color>,
    basic: Option<Color>,
    neutral: Option<Color>,
}

impl PartialPaletteConfig {
    fn into_palette(self) -> Palette {
        let defaults = Palette::default();
        Palette {
            low: self.low.unwrap_or(defaults.low),
            mid: self.mid.unwrap_or(defaults.mid),
            high: self.high.unwrap_or(defaults.high),
            very_high: self.very_high.unwrap_or(defaults.very_high),
            catalytic: self.catalytic.unwrap_or(defaults.catalytic),
            patch: self.patch.unwrap_or(defaults.patch),
            acidic: self.acidic.unwrap_or(defaults.acidic),
            basic: self.basic.unwrap_or(defaults.basic),
            neutral: self.neutral.unwrap_or(defaults.neutral),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialColorConfig {
    scope: Option<String>,
    marker_atom: Option<String>,
    temp_prefix: Option<String>,
    bins: Option<PartialBinsConfig>,
    catalytic: Option<PartialCatalyticConfig>,
    surface: Option<PartialSurfaceConfig>,
    palette: Option<PartialPaletteConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_thresholds(key: &str, value: &str) -> Result<[f64; 3]> {
    let parts: Vec<f64> = value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|v| parse_value(key, v, "float"))
        .collect::<Result<_>>()?;
    <[f64; 3]>::try_from(parts).map_err(|_| {
        CliError::Config(format!(
            "Expected three comma-separated thresholds for {}: {}",
            key, value
        ))
    })
}

impl PartialColorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final configuration: CLI flags, then `--set` values, then the file, then defaults.
    pub fn merge_with_cli(mut self, args: &ColorArgs) -> Result<core_config::ColorConfig> {
        self.apply_set_values(&args.set_values)?;

        let bins = self.bins.take().unwrap_or_default();
        let catalytic = self.catalytic.take().unwrap_or_default();
        let surface = self.surface.take().unwrap_or_default();
        let palette = self.palette.take().unwrap_or_default();

        let mut builder = ColorConfigBuilder::new().palette(palette.into_palette());

        if let Some(scope) = args.scope.as_ref().or(self.scope.as_ref()) {
            builder = builder.scope(scope);
        }
        if let Some(marker) = &self.marker_atom {
            builder = builder.marker_atom(marker);
        }
        if let Some(prefix) = &self.temp_prefix {
            builder = builder.temp_prefix(prefix);
        }
        if let Some(thresholds) = bins.thresholds {
            builder = builder.thresholds(thresholds);
        }
        if let Some(rule) = args.rule.or(bins.rule) {
            builder = builder.rule(rule);
        }
        if let Some(cutoff) = args.cutoff.or(catalytic.cutoff) {
            builder = builder.cutoff(cutoff);
        }
        if args.no_spheres {
            builder = builder.show_spheres(false);
        } else if let Some(spheres) = catalytic.spheres {
            builder = builder.show_spheres(spheres);
        }
        if let Some(scale) = catalytic.sphere_scale {
            builder = builder.sphere_scale(scale);
        }
        if args.surface {
            builder = builder.surface(true);
        } else if let Some(enabled) = surface.enabled {
            builder = builder.surface(enabled);
        }
        if let Some(transparency) = surface.transparency {
            builder = builder.surface_transparency(transparency);
        }

        Ok(builder.build()?)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();

            match key {
                "scope" => self.scope = Some(value_str.trim().to_string()),
                "marker-atom" => self.marker_atom = Some(value_str.trim().to_string()),
                "temp-prefix" => self.temp_prefix = Some(value_str.trim().to_string()),
                "bins.thresholds" => {
                    self.bins.get_or_insert_with(Default::default).thresholds =
                        Some(parse_thresholds(key, value_str)?);
                }
                "bins.rule" => {
                    self.bins.get_or_insert_with(Default::default).rule =
                        Some(parse_value(key, value_str, "rule")?);
                }
                "catalytic.cutoff" => {
                    self.catalytic.get_or_insert_with(Default::default).cutoff =
                        Some(parse_value(key, value_str, "float")?);
                }
                "catalytic.spheres" => {
                    self.catalytic.get_or_insert_with(Default::default).spheres =
                        Some(parse_value(key, value_str, "boolean")?);
                }
                "catalytic.sphere-scale" => {
                    self.catalytic
                        .get_or_insert_with(Default::default)
                        .sphere_scale = Some(parse_value(key, value_str, "float")?);
                }
                "surface.enabled" => {
                    self.surface.get_or_insert_with(Default::default).enabled =
                        Some(parse_value(key, value_str, "boolean")?);
                }
                "surface.transparency" => {
                    self.surface
                        .get_or_insert_with(Default::default)
                        .transparency = Some(parse_value(key, value_str, "float")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
