use crate::error::EmitError;

/// A resource held on the current path, with its rendered teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PendingRelease {
    pub key: String,
    pub block_id: String,
    pub teardown: Vec<String>,
}

/// The ordered set of releases pending on one emitted path.
///
/// Every fork in the control flow clones the stack so each arm tracks its own
/// acquisitions.
#[derive(Debug, Clone, Default)]
pub(super) struct ReleaseStack {
    pending: Vec<PendingRelease>,
}

impl ReleaseStack {
    pub fn acquire(&mut self, release: PendingRelease) -> Result<(), EmitError> {
        if release.teardown.is_empty() {
            return Err(EmitError::UnpairedResource {
                block_id: release.block_id,
                resource: release.key,
                message: "the resource declares no teardown".to_string(),
            });
        }
        if let Some(held) = self.pending.iter().find(|p| p.key == release.key) {
            return Err(EmitError::UnpairedResource {
                message: format!("it is still held since block '{}'", held.block_id),
                block_id: release.block_id,
                resource: release.key,
            });
        }
        self.pending.push(release);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Pops everything acquired after the first `base` entries and returns
    /// their teardown lines, most recent acquisition first.
    pub fn release_down_to(&mut self, base: usize) -> Vec<String> {
        let base = base.min(self.pending.len());
        self.pending
            .drain(base..)
            .rev()
            .flat_map(|release| release.teardown)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(key: &str, line: &str) -> PendingRelease {
        PendingRelease {
            key: key.to_string(),
            block_id: format!("{}_block", key),
            teardown: vec![line.to_string()],
        }
    }

    #[test]
    fn releases_in_reverse_acquisition_order() {
        let mut stack = ReleaseStack::default();
        stack.acquire(held("app", "free(app);")).unwrap();
        stack.acquire(held("gui", "close_gui();")).unwrap();
        stack.acquire(held("storage", "close_storage();")).unwrap();

        assert_eq!(stack.release_down_to(1), vec!["close_storage();", "close_gui();"]);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.release_down_to(0), vec!["free(app);"]);
    }

    #[test]
    fn second_acquisition_of_a_held_key_is_unpaired() {
        let mut stack = ReleaseStack::default();
        stack.acquire(held("storage", "a();")).unwrap();
        let err = stack.acquire(held("storage", "b();")).unwrap_err();
        assert!(matches!(err, EmitError::UnpairedResource { ref resource, .. } if resource == "storage"));
    }

    #[test]
    fn acquisition_without_teardown_is_unpaired() {
        let mut stack = ReleaseStack::default();
        let release = PendingRelease {
            key: "gui".to_string(),
            block_id: "g".to_string(),
            teardown: vec![],
        };
        assert!(stack.acquire(release).is_err());
    }
}
