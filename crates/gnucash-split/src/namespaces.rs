use std::collections::BTreeMap;

use crate::{Result, SplitError};

const GNUCASH_ALIASES: &[&str] = &[
    "gnc",
    "cd",
    "book",
    "slot",
    "cmdty",
    "price",
    "ts",
    "act",
    "trn",
    "split",
    "recurrence",
    "cust",
    "bgt",
    "addr",
    "vendor",
    "sx",
];

/// Maps the short aliases used in qualified names (`act:name`) to the
/// namespace URIs they stand for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    aliases: BTreeMap<String, String>,
}

/// A name with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub namespace: Option<String>,
    pub local: String,
}

impl Namespaces {
    pub fn empty() -> Self {
        Namespaces {
            aliases: BTreeMap::new(),
        }
    }

    /// The vocabulary of GnuCash v2 XML files.
    pub fn gnucash() -> Self {
        let mut namespaces = Namespaces::empty();
        for alias in GNUCASH_ALIASES {
            namespaces.insert(*alias, format!("http://www.gnucash.org/XML/{alias}"));
        }
        namespaces
    }

    pub fn insert(&mut self, alias: impl Into<String>, uri: impl Into<String>) {
        self.aliases.insert(alias.into(), uri.into());
    }

    pub fn uri(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Resolve `alias:local`. Unprefixed names have no namespace.
    pub fn name(&self, qualified: &str) -> Result<Name> {
        match qualified.split_once(':') {
            Some((alias, local)) => {
                let uri = self
                    .uri(alias)
                    .ok_or_else(|| SplitError::UnknownNamespace(alias.to_string()))?;
                Ok(Name {
                    namespace: Some(uri.to_string()),
                    local: local.to_string(),
                })
            }
            None => Ok(Name {
                namespace: None,
                local: qualified.to_string(),
            }),
        }
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Namespaces::gnucash()
    }
}
