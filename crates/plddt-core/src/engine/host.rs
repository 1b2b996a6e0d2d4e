use crate::core::palette::{Color, Rgb};
use crate::core::selection::Selection;
use std::fmt;

/// A display representation the host can toggle per atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Representation {
    Cartoon,
    Sticks,
    Spheres,
    Surface,
}

impl Representation {
    pub fn keyword(self) -> &'static str {
        match self {
            Representation::Cartoon => "cartoon",
            Representation::Sticks => "sticks",
            Representation::Spheres => "spheres",
            Representation::Surface => "surface",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A per-atom rendering option together with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderSetting {
    /// Surface transparency in `[0, 1]`; `0` is opaque.
    Transparency(f64),
    /// Surface color independent of the atom color.
    SurfaceColor(Color),
    SphereScale(f64),
}

impl RenderSetting {
    pub fn name(&self) -> &'static str {
        match self {
            RenderSetting::Transparency(_) => "transparency",
            RenderSetting::SurfaceColor(_) => "surface_color",
            RenderSetting::SphereScale(_) => "sphere_scale",
        }
    }

    /// The value as written in a host `set` command.
    pub fn value_text(&self) -> String {
        match self {
            RenderSetting::Transparency(v) | RenderSetting::SphereScale(v) => format!("{:?}", v),
            RenderSetting::SurfaceColor(c) => c.to_string(),
        }
    }
}

/// Optional features a host may or may not provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// The host can register a menu entry that reapplies the coloring.
    pub menu: bool,
    /// The host can register a named command that runs the coloring pass.
    pub command: bool,
}

/// The command surface of a molecular graphics host.
///
/// Every method maps to one imperative host command. Named selections and
/// objects live in a single namespace owned by the host.
pub trait Host {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates or overwrites the named selection.
    fn select(&mut self, name: &str, selection: &Selection) -> Result<(), Self::Error>;

    /// Deletes a named selection or object. Deleting an unknown name succeeds.
    fn delete(&mut self, name: &str) -> Result<(), Self::Error>;

    fn count_atoms(&self, selection: &Selection) -> Result<usize, Self::Error>;

    fn color(&mut self, color: &Color, selection: &Selection) -> Result<(), Self::Error>;

    /// Registers `name` as a color usable by later [`Host::color`] calls.
    fn set_color(&mut self, name: &str, rgb: Rgb) -> Result<(), Self::Error>;

    fn show(&mut self, representation: Representation, selection: &Selection) -> Result<(), Self::Error>;

    fn set(&mut self, setting: &RenderSetting, selection: &Selection) -> Result<(), Self::Error>;

    /// Copies the atoms matched by `source` into a new object, replacing any object of that name.
    fn create(&mut self, name: &str, source: &Selection) -> Result<(), Self::Error>;

    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::default()
    }

    /// Adds a menu entry that reruns the coloring pass on `scope`.
    ///
    /// Only called when [`Host::capabilities`] reports menu support.
    fn add_menu_item(&mut self, label: &str, scope: &str) -> Result<(), Self::Error>;

    /// Registers `name` as a host command taking an optional scope (default
    /// `all`) and an optional catalytic cutoff.
    ///
    /// Only called when [`Host::capabilities`] reports command support.
    fn add_command(&mut self, name: &str) -> Result<(), Self::Error>;
}
