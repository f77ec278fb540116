use std::collections::BTreeMap;

use dashmap::{DashMap, DashSet};

/// The pair of ids needed to revoke one issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevocationHandle {
    pub rev_reg_id: String,
    pub cred_rev_id: String,
}

impl RevocationHandle {
    pub fn new(rev_reg_id: impl Into<String>, cred_rev_id: impl Into<String>) -> Self {
        Self {
            rev_reg_id: rev_reg_id.into(),
            cred_rev_id: cred_rev_id.into(),
        }
    }
}

/// Bookkeeping for revocable credentials.
///
/// Remembers which handle each issued exchange got, and which
/// revocations were staged without publishing. Purely informational:
/// nothing here re-drives a failed revocation.
#[derive(Debug, Default)]
pub struct RevocationLedger {
    issued: DashMap<String, RevocationHandle>,
    pending: DashSet<RevocationHandle>,
}

impl RevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the handle reported when an exchange was issued.
    pub fn record_issued(&self, credential_exchange_id: impl Into<String>, handle: RevocationHandle) {
        self.issued.insert(credential_exchange_id.into(), handle);
    }

    pub fn issued_handle(&self, credential_exchange_id: &str) -> Option<RevocationHandle> {
        self.issued
            .get(credential_exchange_id)
            .map(|entry| entry.value().clone())
    }

    /// Every issued handle with its exchange id, for operator display.
    pub fn issued(&self) -> Vec<(String, RevocationHandle)> {
        let mut entries: Vec<_> = self
            .issued
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Stage a revocation that was sent with `publish = false`.
    pub fn queue(&self, handle: RevocationHandle) {
        self.pending.insert(handle);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> Vec<RevocationHandle> {
        let mut handles: Vec<_> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        handles.sort_by(|a, b| {
            (a.rev_reg_id.as_str(), a.cred_rev_id.as_str())
                .cmp(&(b.rev_reg_id.as_str(), b.cred_rev_id.as_str()))
        });
        handles
    }

    /// Clear staged entries that a publish-all reported. Returns how
    /// many staged handles were covered.
    pub fn mark_published(&self, rrid2crid: &BTreeMap<String, Vec<String>>) -> usize {
        let mut cleared = 0;
        for (rev_reg_id, cred_rev_ids) in rrid2crid {
            for cred_rev_id in cred_rev_ids {
                let handle = RevocationHandle::new(rev_reg_id.clone(), cred_rev_id.clone());
                if self.pending.remove(&handle).is_some() {
                    cleared += 1;
                }
            }
        }
        cleared
    }
}
