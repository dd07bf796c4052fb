use std::cell::RefCell;
use std::path::PathBuf;

/// One call made against a fake adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    QueryProvisioning {
        volume_group: String,
        volume: String,
    },
    CreateSnapshot {
        origin: String,
        name: String,
        size: Option<String>,
    },
    ActivateSnapshot {
        device: PathBuf,
    },
    Mount {
        device: PathBuf,
        mount_point: PathBuf,
    },
    Unmount {
        mount_point: PathBuf,
    },
    RemoveSnapshot {
        device: PathBuf,
    },
    DirectoryExists {
        host: String,
        path: String,
    },
    Transfer {
        destination: String,
        args: Vec<String>,
        dry_run: bool,
    },
}

impl Call {
    /// Whether the call went to the volume manager
    pub fn is_snapshot_op(&self) -> bool {
        matches!(
            self,
            Self::QueryProvisioning { .. }
                | Self::CreateSnapshot { .. }
                | Self::ActivateSnapshot { .. }
                | Self::RemoveSnapshot { .. }
        )
    }

    /// Short label used when asserting on call order
    pub fn label(&self) -> &'static str {
        match self {
            Self::QueryProvisioning { .. } => "query",
            Self::CreateSnapshot { .. } => "create",
            Self::ActivateSnapshot { .. } => "activate",
            Self::Mount { .. } => "mount",
            Self::Unmount { .. } => "unmount",
            Self::RemoveSnapshot { .. } => "destroy",
            Self::DirectoryExists { .. } => "check",
            Self::Transfer { .. } => "transfer",
        }
    }
}

/// Ordered record of every call made during a test
#[derive(Debug, Default)]
pub struct CallLedger {
    calls: RefCell<Vec<Call>>,
}

impl CallLedger {
    pub fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(Call::label).collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    /// Calls made to the volume manager for one origin volume.
    ///
    /// Activation and removal name the snapshot rather than the origin, so
    /// they are attributed to the origin of the most recent creation.
    pub fn snapshot_calls_for(&self, volume: &str) -> Vec<Call> {
        let mut current_origin: Option<String> = None;
        let mut selected = Vec::new();
        for call in self.calls.borrow().iter() {
            match call {
                Call::QueryProvisioning { volume: queried, .. } => {
                    current_origin = Some(queried.clone());
                }
                Call::CreateSnapshot { origin, .. } => {
                    let name = origin.rsplit('/').next().unwrap_or(origin);
                    current_origin = Some(name.to_string());
                }
                _ => {}
            }
            if call.is_snapshot_op() && current_origin.as_deref() == Some(volume) {
                selected.push(call.clone());
            }
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_snapshot_calls_to_origin() {
        let ledger = CallLedger::default();
        ledger.record(Call::QueryProvisioning {
            volume_group: "vg0".to_string(),
            volume: "root".to_string(),
        });
        ledger.record(Call::CreateSnapshot {
            origin: "vg0/root".to_string(),
            name: "snap".to_string(),
            size: Some("5G".to_string()),
        });
        ledger.record(Call::RemoveSnapshot {
            device: PathBuf::from("/dev/vg0/snap"),
        });
        ledger.record(Call::DirectoryExists {
            host: "backup".to_string(),
            path: "/srv/mirror/vg0/home".to_string(),
        });

        assert_eq!(ledger.snapshot_calls_for("root").len(), 3);
        assert!(ledger.snapshot_calls_for("home").is_empty());
        assert_eq!(ledger.labels(), vec!["query", "create", "destroy", "check"]);
    }
}
