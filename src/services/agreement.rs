//! Terms-of-service agreement shown on first login.

use std::io;

use dashmap::DashSet;

use crate::config::AgreementConfig;

/// Agreement text plus the accounts that accepted it this run.
#[derive(Debug, Default)]
pub struct Agreement {
    rtf: Option<Vec<String>>,
    plain: Option<Vec<String>>,
    accepted: DashSet<String>,
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

impl Agreement {
    /// Read the configured files once at startup.
    pub fn load(config: &AgreementConfig) -> io::Result<Self> {
        let rtf = config
            .rtf_path
            .as_ref()
            .map(std::fs::read_to_string)
            .transpose()?;
        let plain = config
            .plain_path
            .as_ref()
            .map(std::fs::read_to_string)
            .transpose()?;
        Ok(Self::from_text(rtf.as_deref(), plain.as_deref()))
    }

    pub fn from_text(rtf: Option<&str>, plain: Option<&str>) -> Self {
        Self {
            rtf: rtf.map(split_lines),
            plain: plain.map(split_lines),
            accepted: DashSet::new(),
        }
    }

    /// Whether any agreement text is configured.
    pub fn is_required(&self) -> bool {
        self.rtf.is_some() || self.plain.is_some()
    }

    /// Whether `account` must still be shown the agreement.
    pub fn needs(&self, account: &str) -> bool {
        self.is_required() && !self.accepted.contains(&account.to_lowercase())
    }

    pub fn accept(&self, account: &str) {
        self.accepted.insert(account.to_lowercase());
    }

    /// Lines to send, ending with `AGREEMENTEND`. Falls back to whichever
    /// rendering is configured when the preferred one is missing.
    pub fn render(&self, prefer_plain: bool) -> Vec<String> {
        let body = if prefer_plain {
            self.plain.as_ref().or(self.rtf.as_ref())
        } else {
            self.rtf.as_ref().or(self.plain.as_ref())
        };
        let mut lines: Vec<String> = body
            .into_iter()
            .flatten()
            .map(|line| format!("AGREEMENT {line}"))
            .collect();
        lines.push("AGREEMENTEND".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_not_required_without_text() {
        let agreement = Agreement::default();
        assert!(!agreement.is_required());
        assert!(!agreement.needs("bob"));
    }

    #[test]
    fn test_variant_selection() {
        let agreement = Agreement::from_text(Some("{\\rtf1 Rules}"), Some("Rules\nBe nice"));
        assert_eq!(agreement.render(false), vec!["AGREEMENT {\\rtf1 Rules}", "AGREEMENTEND"]);
        assert_eq!(
            agreement.render(true),
            vec!["AGREEMENT Rules", "AGREEMENT Be nice", "AGREEMENTEND"]
        );

        let rtf_only = Agreement::from_text(Some("rich"), None);
        assert_eq!(rtf_only.render(true), vec!["AGREEMENT rich", "AGREEMENTEND"]);
    }

    #[test]
    fn test_acceptance_is_case_insensitive() {
        let agreement = Agreement::from_text(None, Some("Rules"));
        assert!(agreement.needs("Bob"));
        agreement.accept("BOB");
        assert!(!agreement.needs("bob"));
    }

    #[test]
    fn test_load_from_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Line one").unwrap();
        let config = AgreementConfig {
            rtf_path: None,
            plain_path: Some(file.path().to_string_lossy().into_owned()),
        };
        let agreement = Agreement::load(&config).unwrap();
        assert_eq!(agreement.render(false), vec!["AGREEMENT Line one", "AGREEMENTEND"]);

        let missing = AgreementConfig {
            rtf_path: Some("/nonexistent/agreement.rtf".into()),
            plain_path: None,
        };
        assert!(Agreement::load(&missing).is_err());
    }
}
