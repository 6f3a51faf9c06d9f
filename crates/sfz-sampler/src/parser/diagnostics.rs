use std::collections::BTreeSet;

use crate::config::SamplerConfig;

/// Soft diagnostics collected during one compilation pass
///
/// The caller owns the context and threads it through every compile call of
/// a pass, so an opcode name that appears in many regions is reported once.
/// Nothing in the crate reads it back for control flow; it is for display.
#[derive(Debug, Clone)]
pub struct SamplerErrorContext {
    unrecognized: BTreeSet<String>,
    invalid_values: BTreeSet<String>,
    warn_unrecognized: bool,
}

impl Default for SamplerErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerErrorContext {
    pub fn new() -> Self {
        Self {
            unrecognized: BTreeSet::new(),
            invalid_values: BTreeSet::new(),
            warn_unrecognized: true,
        }
    }

    pub fn with_config(config: &SamplerConfig) -> Self {
        Self {
            warn_unrecognized: config.warn_unrecognized,
            ..Self::new()
        }
    }

    /// Record an unknown opcode name; returns true on its first sighting
    pub fn record_unrecognized(&mut self, name: &str) -> bool {
        if self.unrecognized.contains(name) {
            return false;
        }
        if self.warn_unrecognized {
            log::warn!("unrecognized opcode {}", name);
        }
        self.unrecognized.insert(name.to_string())
    }

    /// Record a pair that was dropped or had no effect because of its value
    pub fn record_invalid_value(&mut self, key: &str, value: &str) {
        self.invalid_values.insert(format!("{}={}", key, value));
    }

    /// Unknown opcode names, sorted
    pub fn unrecognized_opcodes(&self) -> impl Iterator<Item = &str> {
        self.unrecognized.iter().map(String::as_str)
    }

    /// `key=value` texts whose value did not convert, sorted
    pub fn invalid_values(&self) -> impl Iterator<Item = &str> {
        self.invalid_values.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.unrecognized.is_empty() && self.invalid_values.is_empty()
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.unrecognized.is_empty() {
            let names: Vec<&str> = self.unrecognized_opcodes().collect();
            parts.push(format!("unrecognized opcodes: {}", names.join(", ")));
        }
        if !self.invalid_values.is_empty() {
            let values: Vec<&str> = self.invalid_values().collect();
            parts.push(format!("invalid values: {}", values.join(", ")));
        }
        parts.join("; ")
    }

    /// Forget everything recorded, keeping the settings
    pub fn clear(&mut self) {
        self.unrecognized.clear();
        self.invalid_values.clear();
    }
}
