//! An in-memory molecular scene implementing [`Host`].
//!
//! The scene evaluates selection predicates against a [`Structure`], keeps
//! per-atom display state, and records every state-changing command in host
//! script syntax so a pass can be replayed in a real viewer.

use super::host::{Host, HostCapabilities, RenderSetting, Representation};
use crate::core::models::ids::AtomId;
use crate::core::models::structure::Structure;
use crate::core::palette::{BUILTIN_COLORS, Color, Rgb};
use crate::core::selection::{AtomField, Selection};
use slotmap::SecondaryMap;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SceneError {
    #[error("Unknown selection or object '{0}'")]
    UnknownSelection(String),
    #[error("Unknown color '{0}'")]
    UnknownColor(String),
    #[error("Invalid name '{0}': names must be non-empty and contain no whitespace")]
    InvalidName(String),
    #[error("Name '{0}' is reserved by the selection language")]
    ReservedName(String),
    #[error("Invalid value for setting '{setting}': {value}")]
    InvalidSetting { setting: &'static str, value: String },
    #[error("Menu entries are not supported by this scene")]
    MenuUnsupported,
    #[error("Commands cannot be registered with this scene")]
    CommandUnsupported,
    #[error("Malformed scope '{expr}': {reason}")]
    MalformedScope { expr: String, reason: String },
}

const RESERVED_NAMES: [&str; 8] = ["all", "none", "and", "or", "not", "chain", "resn", "name"];

/// Per-atom values written by `set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomSettings {
    pub transparency: Option<f64>,
    pub surface_color: Option<Color>,
    pub sphere_scale: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub scope: String,
}

#[derive(Debug, Default)]
pub struct Scene {
    structure: Structure,
    selections: HashMap<String, BTreeSet<AtomId>>,
    custom_colors: HashMap<String, Rgb>,
    atom_colors: SecondaryMap<AtomId, Color>,
    representations: SecondaryMap<AtomId, BTreeSet<Representation>>,
    settings: SecondaryMap<AtomId, AtomSettings>,
    capabilities: HostCapabilities,
    menu: Vec<MenuEntry>,
    commands: Vec<String>,
    command_log: Vec<String>,
}

impl Scene {
    pub fn new(structure: Structure) -> Self {
        Self {
            structure,
            ..Default::default()
        }
    }

    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Looks up an atom by object, chain, residue number and atom name.
    pub fn find_atom(&self, object: &str, chain: char, residue: isize, name: &str) -> Option<AtomId> {
        let object_id = self.structure.find_object_by_name(object)?;
        let chain_id = self.structure.find_chain(object_id, chain)?;
        let residue_id = self.structure.find_residue(chain_id, residue)?;
        self.structure.residue(residue_id)?.get_atom_id_by_name(name)
    }

    pub fn atom_color(&self, atom: AtomId) -> Option<&Color> {
        self.atom_colors.get(atom)
    }

    pub fn representations(&self, atom: AtomId) -> BTreeSet<Representation> {
        self.representations.get(atom).cloned().unwrap_or_default()
    }

    pub fn atom_settings(&self, atom: AtomId) -> AtomSettings {
        self.settings.get(atom).cloned().unwrap_or_default()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.selections.contains_key(name) || self.structure.find_object_by_name(name).is_some()
    }

    pub fn selection_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.selections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn custom_color(&self, name: &str) -> Option<Rgb> {
        self.custom_colors.get(name).copied()
    }

    pub fn menu_items(&self) -> &[MenuEntry] {
        &self.menu
    }

    pub fn registered_commands(&self) -> &[String] {
        &self.commands
    }

    pub fn command_log(&self) -> &[String] {
        &self.command_log
    }

    /// The recorded commands as a host script, one command per line.
    pub fn script(&self) -> String {
        let mut script = self.command_log.join("\n");
        if !script.is_empty() {
            script.push('\n');
        }
        script
    }

    /// Resolves a predicate to the set of atoms it matches.
    pub fn evaluate(&self, selection: &Selection) -> Result<BTreeSet<AtomId>, SceneError> {
        match selection {
            Selection::Scope(expr) => self.evaluate_scope(expr),
            Selection::Named(name) => self.resolve_name(name),
            Selection::AtomName(name) => Ok(self.filter_atoms(|atom_id| {
                self.structure.atom(atom_id).is_some_and(|a| &a.name == name)
            })),
            Selection::ResidueNames(names) => Ok(self.filter_atoms(|atom_id| {
                self.structure
                    .atom_context(atom_id)
                    .is_some_and(|(_, _, r)| names.iter().any(|n| n.eq_ignore_ascii_case(&r.name)))
            })),
            Selection::Compare { field, op, value } => Ok(self.filter_atoms(|atom_id| {
                self.structure.atom(atom_id).is_some_and(|a| {
                    let lhs = match field {
                        AtomField::BFactor => a.b_factor,
                        AtomField::Occupancy => a.occupancy,
                    };
                    op.holds(lhs, *value)
                })
            })),
            Selection::And(a, b) => {
                let left = self.evaluate(a)?;
                let right = self.evaluate(b)?;
                Ok(left.intersection(&right).copied().collect())
            }
            Selection::Or(a, b) => {
                let mut left = self.evaluate(a)?;
                left.extend(self.evaluate(b)?);
                Ok(left)
            }
            Selection::Not(inner) => {
                let excluded = self.evaluate(inner)?;
                Ok(self.filter_atoms(|atom_id| !excluded.contains(&atom_id)))
            }
            Selection::ByResidue(inner) => {
                let seeds = self.evaluate(inner)?;
                let mut expanded = BTreeSet::new();
                for atom_id in seeds {
                    if let Some(residue) = self
                        .structure
                        .atom(atom_id)
                        .and_then(|a| self.structure.residue(a.residue_id))
                    {
                        expanded.extend(residue.atoms().iter().copied());
                    }
                }
                Ok(expanded)
            }
        }
    }

    fn filter_atoms(&self, keep: impl Fn(AtomId) -> bool) -> BTreeSet<AtomId> {
        self.structure
            .atoms_iter()
            .map(|(id, _)| id)
            .filter(|&id| keep(id))
            .collect()
    }

    fn resolve_name(&self, name: &str) -> Result<BTreeSet<AtomId>, SceneError> {
        if let Some(atoms) = self.selections.get(name) {
            return Ok(atoms.clone());
        }
        if let Some(object_id) = self.structure.find_object_by_name(name) {
            return Ok(self.filter_atoms(|atom_id| {
                self.structure
                    .atom_context(atom_id)
                    .is_some_and(|(_, chain, _)| chain.object_id == object_id)
            }));
        }
        Err(SceneError::UnknownSelection(name.to_string()))
    }

    /// Scope expressions: `all`, `none`, `chain X`, `resn A+B`, `name X` or a
    /// selection/object name, combined with `not`, `and`, `or` and parentheses.
    /// `not` binds tighter than `and`, which binds tighter than `or`.
    fn evaluate_scope(&self, expr: &str) -> Result<BTreeSet<AtomId>, SceneError> {
        let mut parser = ScopeParser {
            scene: self,
            expr,
            tokens: tokenize_scope(expr),
            pos: 0,
        };
        let atoms = parser.parse_or()?;
        match parser.peek() {
            None => Ok(atoms),
            Some(token) => Err(parser.malformed(format!("unexpected '{}'", token))),
        }
    }

    fn evaluate_keyword(&self, keyword: &str, arg: &str) -> Result<BTreeSet<AtomId>, SceneError> {
        match keyword {
            "chain" => {
                let mut chars = arg.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(SceneError::UnknownSelection(format!("chain {}", arg)));
                };
                Ok(self.filter_atoms(|atom_id| {
                    self.structure
                        .atom_context(atom_id)
                        .is_some_and(|(_, chain, _)| chain.id == c)
                }))
            }
            "resn" => self.evaluate(&Selection::residue_names(arg.split('+'))),
            _ => self.evaluate(&Selection::atom_name(arg)),
        }
    }

    fn evaluate_word(&self, word: &str) -> Result<BTreeSet<AtomId>, SceneError> {
        match word {
            "all" => Ok(self.filter_atoms(|_| true)),
            "none" => Ok(BTreeSet::new()),
            name => self.resolve_name(name),
        }
    }

    fn check_name(name: &str) -> Result<(), SceneError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(SceneError::InvalidName(name.to_string()));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(SceneError::ReservedName(name.to_string()));
        }
        Ok(())
    }

    fn check_color(&self, color: &Color) -> Result<(), SceneError> {
        match color {
            Color::Named(name)
                if !BUILTIN_COLORS.contains_key(name.as_str())
                    && !self.custom_colors.contains_key(name) =>
            {
                Err(SceneError::UnknownColor(name.clone()))
            }
            _ => Ok(()),
        }
    }

    fn record(&mut self, command: String) {
        trace!("scene: {}", command);
        self.command_log.push(command);
    }

    /// Drops references to atoms that no longer exist in the structure.
    fn purge_dangling(&mut self) {
        let structure = &self.structure;
        for atoms in self.selections.values_mut() {
            atoms.retain(|&id| structure.atom(id).is_some());
        }
        self.atom_colors.retain(|id, _| structure.atom(id).is_some());
        self.representations.retain(|id, _| structure.atom(id).is_some());
        self.settings.retain(|id, _| structure.atom(id).is_some());
    }
}

/// Splits a scope expression into words and single parentheses.
fn tokenize_scope(expr: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in expr.char_indices() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(&expr[s..i]);
            }
            if !c.is_whitespace() {
                tokens.push(&expr[i..i + 1]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&expr[s..]);
    }
    tokens
}

/// Recursive-descent evaluator over scope tokens.
struct ScopeParser<'a, 's> {
    scene: &'a Scene,
    expr: &'s str,
    tokens: Vec<&'s str>,
    pos: usize,
}

impl<'s> ScopeParser<'_, 's> {
    fn peek(&self) -> Option<&'s str> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'s str> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn malformed(&self, reason: String) -> SceneError {
        SceneError::MalformedScope {
            expr: self.expr.to_string(),
            reason,
        }
    }

    fn parse_or(&mut self) -> Result<BTreeSet<AtomId>, SceneError> {
        let mut atoms = self.parse_and()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            atoms.extend(self.parse_and()?);
        }
        Ok(atoms)
    }

    fn parse_and(&mut self) -> Result<BTreeSet<AtomId>, SceneError> {
        let mut atoms = self.parse_unary()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            let rhs = self.parse_unary()?;
            atoms = atoms.intersection(&rhs).copied().collect();
        }
        Ok(atoms)
    }

    fn parse_unary(&mut self) -> Result<BTreeSet<AtomId>, SceneError> {
        match self.advance() {
            Some("not") => {
                let excluded = self.parse_unary()?;
                Ok(self.scene.filter_atoms(|atom_id| !excluded.contains(&atom_id)))
            }
            Some("(") => {
                let atoms = self.parse_or()?;
                match self.advance() {
                    Some(")") => Ok(atoms),
                    _ => Err(self.malformed("unbalanced parentheses".to_string())),
                }
            }
            Some(keyword @ ("chain" | "resn" | "name")) => match self.advance() {
                Some(arg) if !matches!(arg, "(" | ")" | "and" | "or" | "not") => {
                    self.scene.evaluate_keyword(keyword, arg)
                }
                _ => Err(self.malformed(format!("'{}' needs an argument", keyword))),
            },
            Some(token @ (")" | "and" | "or")) => {
                Err(self.malformed(format!("expected a term before '{}'", token)))
            }
            Some(word) => self.scene.evaluate_word(word),
            None => Err(self.malformed("expected a term".to_string())),
        }
    }
}

impl Host for Scene {
    type Error = SceneError;

    fn select(&mut self, name: &str, selection: &Selection) -> Result<(), SceneError> {
        Self::check_name(name)?;
        if self.structure.find_object_by_name(name).is_some() {
            return Err(SceneError::InvalidName(name.to_string()));
        }
        let atoms = self.evaluate(selection)?;
        self.selections.insert(name.to_string(), atoms);
        self.record(format!("select {}, {}", name, selection));
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), SceneError> {
        let removed_selection = self.selections.remove(name).is_some();
        let removed_object = match self.structure.find_object_by_name(name) {
            Some(object_id) => self.structure.remove_object(object_id).is_some(),
            None => false,
        };
        if removed_object {
            self.purge_dangling();
        }
        if removed_selection || removed_object {
            self.record(format!("delete {}", name));
        }
        Ok(())
    }

    fn count_atoms(&self, selection: &Selection) -> Result<usize, SceneError> {
        Ok(self.evaluate(selection)?.len())
    }

    fn color(&mut self, color: &Color, selection: &Selection) -> Result<(), SceneError> {
        self.check_color(color)?;
        for atom_id in self.evaluate(selection)? {
            self.atom_colors.insert(atom_id, color.clone());
        }
        self.record(format!("color {}, {}", color, selection));
        Ok(())
    }

    fn set_color(&mut self, name: &str, rgb: Rgb) -> Result<(), SceneError> {
        Self::check_name(name)?;
        self.custom_colors.insert(name.to_string(), rgb);
        let [r, g, b] = rgb.components();
        self.record(format!("set_color {}, [{:?}, {:?}, {:?}]", name, r, g, b));
        Ok(())
    }

    fn show(&mut self, representation: Representation, selection: &Selection) -> Result<(), SceneError> {
        for atom_id in self.evaluate(selection)? {
            if let Some(reps) = self.representations.entry(atom_id) {
                reps.or_default().insert(representation);
            }
        }
        self.record(format!("show {}, {}", representation, selection));
        Ok(())
    }

    fn set(&mut self, setting: &RenderSetting, selection: &Selection) -> Result<(), SceneError> {
        match setting {
            RenderSetting::Transparency(v) if !(0.0..=1.0).contains(v) => {
                return Err(SceneError::InvalidSetting {
                    setting: setting.name(),
                    value: setting.value_text(),
                });
            }
            RenderSetting::SphereScale(v) if !(v.is_finite() && *v > 0.0) => {
                return Err(SceneError::InvalidSetting {
                    setting: setting.name(),
                    value: setting.value_text(),
                });
            }
            RenderSetting::SurfaceColor(color) => self.check_color(color)?,
            _ => {}
        }
        for atom_id in self.evaluate(selection)? {
            let Some(entry) = self.settings.entry(atom_id) else {
                continue;
            };
            let values = entry.or_default();
            match setting {
                RenderSetting::Transparency(v) => values.transparency = Some(*v),
                RenderSetting::SurfaceColor(c) => values.surface_color = Some(c.clone()),
                RenderSetting::SphereScale(v) => values.sphere_scale = Some(*v),
            }
        }
        self.record(format!(
            "set {}, {}, {}",
            setting.name(),
            setting.value_text(),
            selection
        ));
        Ok(())
    }

    fn create(&mut self, name: &str, source: &Selection) -> Result<(), SceneError> {
        Self::check_name(name)?;
        let atoms: Vec<AtomId> = self.evaluate(source)?.into_iter().collect();
        self.selections.remove(name);
        let copied = self.structure.copy_atoms_into(name, &atoms);
        self.purge_dangling();
        for (new_id, source_id) in copied {
            if let Some(color) = self.atom_colors.get(source_id).cloned() {
                self.atom_colors.insert(new_id, color);
            }
        }
        self.record(format!("create {}, {}", name, source));
        Ok(())
    }

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn add_menu_item(&mut self, label: &str, scope: &str) -> Result<(), SceneError> {
        if !self.capabilities.menu {
            return Err(SceneError::MenuUnsupported);
        }
        self.menu.retain(|entry| entry.label != label);
        self.menu.push(MenuEntry {
            label: label.to_string(),
            scope: scope.to_string(),
        });
        Ok(())
    }

    fn add_command(&mut self, name: &str) -> Result<(), SceneError> {
        if !self.capabilities.command {
            return Err(SceneError::CommandUnsupported);
        }
        if !self.commands.iter().any(|c| c == name) {
            self.commands.push(name.to_string());
        }
        Ok(())
    }
}
