//! Update-file advertisements keyed by client version.

use std::collections::HashMap;

use crate::config::UpdateEntry;

/// Version string that matches any client without its own entry.
pub const DEFAULT_VERSION: &str = "default";

#[derive(Debug, Default)]
pub struct UpdateCatalog {
    entries: HashMap<String, UpdateEntry>,
}

impl UpdateCatalog {
    pub fn new(entries: &[UpdateEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|entry| (entry.version.clone(), entry.clone()))
                .collect(),
        }
    }

    /// Exact version first, then the default entry.
    pub fn lookup(&self, version: &str) -> Option<&UpdateEntry> {
        self.entries
            .get(version)
            .or_else(|| self.entries.get(DEFAULT_VERSION))
    }

    /// `OFFERFILE` line for `version`, if anything is on offer.
    pub fn offer_line(&self, version: &str) -> Option<String> {
        self.lookup(version)
            .map(|entry| format!("OFFERFILE {} {}", entry.url, entry.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, url: &str) -> UpdateEntry {
        UpdateEntry {
            version: version.into(),
            url: url.into(),
            description: "New lobby".into(),
        }
    }

    #[test]
    fn test_exact_then_default() {
        let catalog = UpdateCatalog::new(&[
            entry("Lobby 0.9", "http://u/0.9.exe"),
            entry(DEFAULT_VERSION, "http://u/latest.exe"),
        ]);
        assert_eq!(
            catalog.offer_line("Lobby 0.9").as_deref(),
            Some("OFFERFILE http://u/0.9.exe New lobby")
        );
        assert_eq!(
            catalog.offer_line("Lobby 0.1").as_deref(),
            Some("OFFERFILE http://u/latest.exe New lobby")
        );
    }

    #[test]
    fn test_no_offer() {
        let catalog = UpdateCatalog::new(&[entry("Lobby 0.9", "http://u/0.9.exe")]);
        assert!(catalog.offer_line("Lobby 0.1").is_none());
    }
}
