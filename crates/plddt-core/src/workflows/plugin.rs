use super::color;
use crate::core::counts::Summary;
use crate::engine::config::{ColorConfig, DEFAULT_SCOPE};
use crate::engine::host::Host;
use crate::engine::progress::ProgressReporter;
use tracing::{debug, info, warn};

pub const MENU_LABEL: &str = "pLDDT Coloring (reapply)";
/// Host command that runs the pass with an optional scope and cutoff.
pub const COMMAND_NAME: &str = "color_plddt";

/// What happened while the plugin was loading.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInit {
    /// Summary of the automatic pass, if its counting steps succeeded.
    pub summary: Option<Summary>,
    /// User-facing failure lines of the automatic pass.
    pub failures: Vec<String>,
    pub command_registered: bool,
    pub menu_registered: bool,
}

/// Load-time hook: colors the default scope once, then registers the
/// `color_plddt` command and a menu entry that reapplies the coloring, each
/// only when the host supports it.
///
/// Never fails; every problem is logged and reflected in the returned [`PluginInit`].
pub fn init_plugin<H: Host>(host: &mut H, config: &ColorConfig, reporter: &ProgressReporter) -> PluginInit {
    let config = ColorConfig {
        scope: DEFAULT_SCOPE.to_string(),
        ..config.clone()
    };
    let applied = color::apply(host, &config, reporter);
    if applied.summary.is_some() {
        info!("[pLDDT] Auto coloring applied (default selection: {}).", DEFAULT_SCOPE);
    } else {
        warn!("[pLDDT] Auto coloring failed; the command remains available.");
    }

    let command_registered = if host.capabilities().command {
        match host.add_command(COMMAND_NAME) {
            Ok(()) => true,
            Err(e) => {
                warn!("[pLDDT] Could not register command '{}': {}", COMMAND_NAME, e);
                false
            }
        }
    } else {
        debug!("Host cannot register commands; skipping '{}'.", COMMAND_NAME);
        false
    };

    let menu_registered = if host.capabilities().menu {
        match host.add_menu_item(MENU_LABEL, DEFAULT_SCOPE) {
            Ok(()) => true,
            Err(e) => {
                warn!("[pLDDT] Could not register menu entry '{}': {}", MENU_LABEL, e);
                false
            }
        }
    } else {
        debug!("Host has no menu support; skipping menu registration.");
        false
    };

    PluginInit {
        summary: applied.summary,
        failures: applied.failures,
        command_registered,
        menu_registered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::StructureBuilder;
    use crate::engine::config::ColorConfigBuilder;
    use crate::engine::host::HostCapabilities;
    use crate::engine::scene::Scene;

    fn scene() -> Scene {
        let mut b = StructureBuilder::new();
        b.start_object("model");
        b.start_chain('A').unwrap();
        b.start_residue(1, "SER").unwrap();
        b.add_atom(1, "CA", 91.0, 9.9).unwrap();
        Scene::new(b.build())
    }

    #[test]
    fn init_colors_and_registers_menu_when_supported() {
        let mut host = scene().with_capabilities(HostCapabilities {
            menu: true,
            ..Default::default()
        });
        let init = init_plugin(&mut host, &ColorConfig::default(), &ProgressReporter::new());
        assert!(init.menu_registered);
        assert!(!init.command_registered);
        let summary = init.summary.unwrap();
        assert_eq!(summary.counts.very_high, 1);
        assert_eq!(summary.counts.catalytic, 1);
        assert_eq!(host.menu_items().len(), 1);
        assert_eq!(host.menu_items()[0].label, MENU_LABEL);
        assert_eq!(host.menu_items()[0].scope, "all");
    }

    #[test]
    fn init_without_menu_support_skips_registration() {
        let mut host = scene();
        let init = init_plugin(&mut host, &ColorConfig::default(), &ProgressReporter::new());
        assert!(!init.menu_registered);
        assert!(!init.command_registered);
        assert!(init.summary.is_some());
        assert!(init.failures.is_empty());
        assert!(host.menu_items().is_empty());
        assert!(host.registered_commands().is_empty());
    }

    #[test]
    fn init_registers_command_when_supported() {
        let mut host = scene().with_capabilities(HostCapabilities {
            command: true,
            ..Default::default()
        });
        let init = init_plugin(&mut host, &ColorConfig::default(), &ProgressReporter::new());
        assert!(init.command_registered);
        assert!(!init.menu_registered);
        assert_eq!(host.registered_commands(), [COMMAND_NAME.to_string()]);
    }

    #[test]
    fn init_always_uses_default_scope() {
        let mut host = scene();
        let config = ColorConfigBuilder::new().scope("ghost").build().unwrap();
        let init = init_plugin(&mut host, &config, &ProgressReporter::new());
        assert_eq!(init.summary.unwrap().scope, "all");
    }

    #[test]
    fn init_survives_a_failing_pass() {
        let mut host = scene().with_capabilities(HostCapabilities {
            menu: true,
            command: true,
        });
        let mut config = ColorConfig::default();
        config.marker_atom = "C A".to_string();
        let init = init_plugin(&mut host, &config, &ProgressReporter::new());
        assert!(init.summary.is_none());
        assert_eq!(init.failures.len(), 1);
        assert!(init.failures[0].contains("marker atom"));
        assert!(init.command_registered);
        assert!(init.menu_registered);
    }
}
