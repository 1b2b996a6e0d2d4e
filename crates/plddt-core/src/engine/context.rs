use super::host::Host;
use crate::core::confidence::ConfidenceBin;
use tracing::debug;

/// Names of the temporary selections, objects and colors owned by one pass.
///
/// Names are derived deterministically from the prefix and marker atom, so a
/// later pass with the same configuration finds and replaces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassContext {
    prefix: String,
    marker: String,
}

impl PassContext {
    pub fn new(prefix: &str, marker_atom: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            marker: marker_atom.to_ascii_lowercase(),
        }
    }

    pub fn bin_selection(&self, bin: ConfidenceBin) -> String {
        format!("{}_{}_{}", self.prefix, bin.key(), self.marker)
    }

    pub fn catalytic_selection(&self) -> String {
        format!("{}_catalytic_{}", self.prefix, self.marker)
    }

    pub fn patch_object(&self) -> String {
        format!("{}_catalytic_patch", self.prefix)
    }

    pub fn catalytic_color(&self) -> String {
        format!("{}_catalytic", self.prefix)
    }

    pub fn patch_color(&self) -> String {
        format!("{}_patch", self.prefix)
    }

    /// Every selection and object name a pass may create.
    pub fn scene_names(&self) -> Vec<String> {
        let mut names: Vec<String> = ConfidenceBin::ALL
            .into_iter()
            .map(|bin| self.bin_selection(bin))
            .collect();
        names.push(self.catalytic_selection());
        names.push(self.patch_object());
        names
    }

    /// Deletes every scene name this context owns. Failures are logged and ignored.
    pub fn reset<H: Host>(&self, host: &mut H) {
        for name in self.scene_names() {
            if let Err(e) = host.delete(&name) {
                debug!("Ignoring failure to delete temporary name '{}': {}", name, e);
            }
        }
    }
}
