//! Shared accumulator for discovered public addresses
//!
//! Every launcher task records the address → hostname pairs it observes
//! while polling. The map only ever grows for the lifetime of a run; the
//! first hostname seen for an address is the one that sticks.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mutex-guarded map from public IP address to public DNS name, shared by
/// all launcher tasks through cheap clones.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address → hostname pair. Returns `true` if the address was
    /// new; a repeat observation is a no-op and keeps the first hostname.
    pub fn record(&self, address: &str, hostname: &str) -> bool {
        let mut map = self.inner.lock().expect("address book lock poisoned");
        match map.entry(address.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(hostname.to_string());
                true
            }
        }
    }

    /// Number of unique addresses recorded so far.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("address book lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents, sorted by address for stable output.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let map = self.inner.lock().expect("address book lock poisoned");
        let mut pairs: Vec<_> = map
            .iter()
            .map(|(ip, dns)| (ip.clone(), dns.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}
