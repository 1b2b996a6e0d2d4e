//! PyMOL bindings: exposes the coloring pass as `plddtpaint.color_plddt(cmd, ...)`
//! and the load-time hook as `plddtpaint.init_plugin(cmd)`.
//!
//! Nothing here raises for a failed pass or bad arguments: problems are printed
//! to the host console and the call returns `None`.

use plddtpaint::core::confidence::{self, BinThresholds, BoundaryRule, DEFAULT_CATALYTIC_CUTOFF};
use plddtpaint::core::palette::{Color, Rgb};
use plddtpaint::core::selection::Selection;
use plddtpaint::engine::config::{ColorConfig, DEFAULT_SCOPE};
use plddtpaint::engine::host::{Host, HostCapabilities, RenderSetting, Representation};
use plddtpaint::engine::progress::ProgressReporter;
use plddtpaint::workflows::color::Applied;
use plddtpaint::workflows::{color, plugin};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyTuple};
use tracing::{debug, warn};

const MENU_MODULE: &str = "pymol.plugins";
const MENU_FUNCTION: &str = "addmenuitemqt";
const EXTEND_METHOD: &str = "extend";

/// A [`Host`] backed by a PyMOL `cmd` module or any object with the same methods.
struct PymolHost<'py> {
    cmd: Bound<'py, PyAny>,
    capabilities: HostCapabilities,
}

impl<'py> PymolHost<'py> {
    fn new(cmd: Bound<'py, PyAny>, capabilities: HostCapabilities) -> Self {
        Self { cmd, capabilities }
    }
}

impl Host for PymolHost<'_> {
    type Error = PyErr;

    fn select(&mut self, name: &str, selection: &Selection) -> PyResult<()> {
        self.cmd.call_method1("select", (name, selection.to_string()))?;
        Ok(())
    }

    fn delete(&mut self, name: &str) -> PyResult<()> {
        self.cmd.call_method1("delete", (name,))?;
        Ok(())
    }

    fn count_atoms(&self, selection: &Selection) -> PyResult<usize> {
        self.cmd
            .call_method1("count_atoms", (selection.to_string(),))?
            .extract()
    }

    fn color(&mut self, color: &Color, selection: &Selection) -> PyResult<()> {
        self.cmd
            .call_method1("color", (color.to_string(), selection.to_string()))?;
        Ok(())
    }

    fn set_color(&mut self, name: &str, rgb: Rgb) -> PyResult<()> {
        self.cmd
            .call_method1("set_color", (name, rgb.components().to_vec()))?;
        Ok(())
    }

    fn show(&mut self, representation: Representation, selection: &Selection) -> PyResult<()> {
        self.cmd
            .call_method1("show", (representation.keyword(), selection.to_string()))?;
        Ok(())
    }

    fn set(&mut self, setting: &RenderSetting, selection: &Selection) -> PyResult<()> {
        let selection = selection.to_string();
        match setting {
            RenderSetting::Transparency(v) | RenderSetting::SphereScale(v) => {
                self.cmd.call_method1("set", (setting.name(), *v, selection))?
            }
            RenderSetting::SurfaceColor(c) => {
                self.cmd
                    .call_method1("set", (setting.name(), c.to_string(), selection))?
            }
        };
        Ok(())
    }

    fn create(&mut self, name: &str, source: &Selection) -> PyResult<()> {
        self.cmd.call_method1("create", (name, source.to_string()))?;
        Ok(())
    }

    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn add_menu_item(&mut self, label: &str, scope: &str) -> PyResult<()> {
        let py = self.cmd.py();
        let cmd = self.cmd.clone().unbind();
        let scope = scope.to_string();
        let reapply = PyCFunction::new_closure(
            py,
            None,
            None,
            move |args: &Bound<'_, PyTuple>, _kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<()> {
                run_pass(cmd.bind(args.py()).clone(), &scope, None)?;
                Ok(())
            },
        )?;
        py.import(MENU_MODULE)?
            .call_method1(MENU_FUNCTION, (label, reapply))?;
        Ok(())
    }

    fn add_command(&mut self, name: &str) -> PyResult<()> {
        let py = self.cmd.py();
        let cmd = self.cmd.clone().unbind();
        let command = PyCFunction::new_closure(
            py,
            None,
            None,
            move |args: &Bound<'_, PyTuple>, kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<Option<String>> {
                let py = args.py();
                let (selection, cutoff) = match command_arguments(args, kwargs)? {
                    Ok(parsed) => parsed,
                    Err(message) => {
                        say(py, &format!("[pLDDT] Invalid arguments: {}", message))?;
                        return Ok(None);
                    }
                };
                run_pass(cmd.bind(py).clone(), &selection, cutoff)
            },
        )?;
        self.cmd.call_method1(EXTEND_METHOD, (name, command))?;
        Ok(())
    }
}

/// Prints one line through Python so it lands in the host console.
fn say(py: Python<'_>, line: &str) -> PyResult<()> {
    py.import("builtins")?.call_method1("print", (line,))?;
    Ok(())
}

/// Prints every failure line, then the summary when there is one.
fn echo(py: Python<'_>, applied: &Applied) -> PyResult<()> {
    for line in &applied.failures {
        say(py, line)?;
    }
    if let Some(summary) = &applied.summary {
        say(py, &summary.to_string())?;
    }
    Ok(())
}

/// Runs one best-effort pass. Invalid arguments are printed, not raised.
fn run_pass(cmd: Bound<'_, PyAny>, selection: &str, cutoff: Option<f64>) -> PyResult<Option<String>> {
    let py = cmd.py();
    let mut host = PymolHost::new(cmd, HostCapabilities::default());
    match color::color_plddt(&mut host, Some(selection), cutoff) {
        Ok(applied) => {
            echo(py, &applied)?;
            Ok(applied.summary.map(|s| s.to_string()))
        }
        Err(e) => {
            warn!("[pLDDT] Invalid arguments: {}", e);
            say(py, &format!("[pLDDT] Invalid arguments: {}", e))?;
            Ok(None)
        }
    }
}

/// Reads `selection` and `cutoff` from a host command call, positionally or by
/// keyword. The host passes command-line arguments as strings.
fn command_arguments(
    args: &Bound<'_, PyTuple>,
    kwargs: Option<&Bound<'_, PyDict>>,
) -> PyResult<Result<(String, Option<f64>), String>> {
    let selection = match argument(args, kwargs, 0, "selection")? {
        Some(value) => match value.extract::<String>() {
            Ok(text) => text,
            Err(_) => return Ok(Err(format!("selection must be text, got {}", value))),
        },
        None => DEFAULT_SCOPE.to_string(),
    };
    let cutoff = match argument(args, kwargs, 1, "cutoff")? {
        Some(value) => match parse_cutoff(&value) {
            Ok(cutoff) => Some(cutoff),
            Err(message) => return Ok(Err(message)),
        },
        None => None,
    };
    if args.len() > 2 {
        debug!("Ignoring {} extra positional argument(s).", args.len() - 2);
    }
    Ok(Ok((selection, cutoff)))
}

fn argument<'py>(
    args: &Bound<'py, PyTuple>,
    kwargs: Option<&Bound<'py, PyDict>>,
    index: usize,
    key: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    if let Some(value) = kwargs.map(|kw| kw.get_item(key)).transpose()?.flatten() {
        return Ok(Some(value));
    }
    if index < args.len() {
        return Ok(Some(args.get_item(index)?));
    }
    Ok(None)
}

fn parse_cutoff(value: &Bound<'_, PyAny>) -> Result<f64, String> {
    if let Ok(number) = value.extract::<f64>() {
        return Ok(number);
    }
    match value.extract::<String>() {
        Ok(text) => text
            .trim()
            .parse()
            .map_err(|_| format!("cutoff must be a number, got '{}'", text.trim())),
        Err(_) => Err(format!("cutoff must be a number, got {}", value)),
    }
}

fn menu_available(py: Python<'_>) -> bool {
    match py.import(MENU_MODULE) {
        Ok(module) => module.hasattr(MENU_FUNCTION).unwrap_or(false),
        Err(_) => false,
    }
}

fn parse_rule(rule: &str) -> PyResult<BoundaryRule> {
    rule.parse()
        .map_err(|e: confidence::ParseBoundaryRuleError| PyValueError::new_err(e.to_string()))
}

/// Colors residues in `selection` by the confidence stored in the B-factor column
/// and highlights residues whose marker occupancy exceeds `cutoff`.
///
/// Returns the summary line, or `None` when the counts could not be gathered
/// or the arguments were rejected.
#[pyfunction]
#[pyo3(signature = (cmd, selection="all", cutoff=DEFAULT_CATALYTIC_CUTOFF))]
fn color_plddt(cmd: Bound<'_, PyAny>, selection: &str, cutoff: f64) -> PyResult<Option<String>> {
    run_pass(cmd, selection, Some(cutoff))
}

/// Applies the default coloring once, registers the `color_plddt` command when
/// `cmd` has `extend`, and registers the reapply menu entry.
///
/// `menu` forces menu registration on or off; by default it is enabled when
/// `pymol.plugins.addmenuitemqt` exists.
/// Returns `(summary, menu_registered, command_registered)`.
#[pyfunction]
#[pyo3(signature = (cmd, menu=None))]
fn init_plugin(cmd: Bound<'_, PyAny>, menu: Option<bool>) -> PyResult<(Option<String>, bool, bool)> {
    let py = cmd.py();
    let menu = menu.unwrap_or_else(|| menu_available(py));
    let command = cmd.hasattr(EXTEND_METHOD).unwrap_or(false);
    let mut host = PymolHost::new(cmd, HostCapabilities { menu, command });
    let init = plugin::init_plugin(&mut host, &ColorConfig::default(), &ProgressReporter::new());
    for line in &init.failures {
        say(py, line)?;
    }
    match &init.summary {
        Some(summary) => say(py, &summary.to_string())?,
        None => say(py, "[pLDDT] Auto coloring failed; run color_plddt to retry.")?,
    }
    Ok((
        init.summary.map(|s| s.to_string()),
        init.menu_registered,
        init.command_registered,
    ))
}

/// Bin of a confidence score under the default 50/70/90 thresholds, or `None` for NaN.
#[pyfunction]
#[pyo3(signature = (b, rule="upper-inclusive"))]
fn classify(b: f64, rule: &str) -> PyResult<Option<String>> {
    let rule = parse_rule(rule)?;
    Ok(BinThresholds::default()
        .classify(b, rule)
        .map(|bin| bin.to_string()))
}

/// `True` when the marker value strictly exceeds `cutoff`.
#[pyfunction]
#[pyo3(signature = (q, cutoff=DEFAULT_CATALYTIC_CUTOFF))]
fn is_catalytic(q: f64, cutoff: f64) -> bool {
    confidence::is_catalytic(q, cutoff)
}

#[pymodule(name = "plddtpaint")]
fn python_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(color_plddt, m)?)?;
    m.add_function(wrap_pyfunction!(init_plugin, m)?)?;
    m.add_function(wrap_pyfunction!(classify, m)?)?;
    m.add_function(wrap_pyfunction!(is_catalytic, m)?)?;
    m.add("MENU_LABEL", plugin::MENU_LABEL)?;
    m.add("COMMAND_NAME", plugin::COMMAND_NAME)?;
    Ok(())
}
