use std::collections::HashSet;

/// Device ids currently flagged as errored or offline.
#[derive(Debug, Default)]
pub struct RecoveryLedger {
    errored: HashSet<String>,
}

impl RecoveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a device. Returns `true` only on the first flag since recovery.
    pub fn mark_errored(&mut self, device_id: &str) -> bool {
        if self.errored.contains(device_id) {
            return false;
        }
        self.errored.insert(device_id.to_string())
    }

    /// Clear a device's flag. Returns `true` only if a flag was removed.
    pub fn mark_recovered(&mut self, device_id: &str) -> bool {
        self.errored.remove(device_id)
    }

    pub fn is_errored(&self, device_id: &str) -> bool {
        self.errored.contains(device_id)
    }

    pub fn len(&self) -> usize {
        self.errored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errored.is_empty()
    }
}
