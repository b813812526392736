//! Counter discontinuity detection
//!
//! Two signals invalidate counter history for a row:
//! - the device-reported ifCounterDiscontinuityTime changed since last cycle
//! - the table-wide "SNMP agent restarted" flag is set (applies to every row)

use log::debug;

/// True when a previously known, non-empty marker changed.
///
/// An empty stored marker means nothing has been observed yet, so there is no
/// history to invalidate. An empty fresh value means the device reported
/// nothing for this row.
pub fn has_discontinuity(fresh: &str, stored: &str) -> bool {
    !stored.is_empty() && !fresh.is_empty() && fresh != stored
}

/// Per-cycle detector; carries the one-shot restart flag read for the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscontinuityDetector {
    agent_restarted: bool,
}

impl DiscontinuityDetector {
    pub fn new(agent_restarted: bool) -> Self {
        Self { agent_restarted }
    }

    pub fn agent_restarted(&self) -> bool {
        self.agent_restarted
    }

    /// Decide whether the row's history must be discarded, and record the
    /// fresh marker so the same change never fires twice.
    pub fn check(&self, key: &str, stored: &mut String, fresh: Option<&str>) -> bool {
        let mut changed = false;

        if let Some(fresh) = fresh.filter(|f| !f.is_empty()) {
            changed = has_discontinuity(fresh, stored);
            if changed {
                debug!("Discontinuity on {}: {} -> {}", key, stored, fresh);
            }
            if *stored != fresh {
                *stored = fresh.to_string();
            }
        }

        self.agent_restarted || changed
    }
}
