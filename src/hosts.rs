//! The router's `hosts.txt` address book.
//!
//! ```text
//! # comment
//! forum.i2p=<base64 destination>
//! ```
//!
//! Read-only. The first entry for a name wins.

use std::{
    collections::HashMap,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    data::{Destination, Structure},
    error::{Error, Result},
};

#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: Vec<(String, Destination)>,
    index: HashMap<String, usize>,
}

impl AddressBook {
    /// Loads `path`. Lines that don't parse are skipped with a warning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let book: Self = text.parse()?;
        tracing::debug!(path = %path.display(), entries = book.len(), "loaded address book");
        Ok(book)
    }

    /// Loads `~/.i2p/hosts.txt`.
    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn get(&self, name: &str) -> Option<&Destination> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn contains_destination(&self, destination: &Destination) -> bool {
        self.entries.iter().any(|(_, d)| d == destination)
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Destination)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, destination: Destination) {
        if self.index.contains_key(&name) {
            tracing::debug!(%name, "duplicate address book entry ignored");
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, destination));
    }
}

impl std::str::FromStr for AddressBook {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut book = Self::default();
        for (number, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                tracing::warn!(line = number + 1, "address book line without '='");
                continue;
            };
            match Destination::parse(value.trim()) {
                Ok(destination) => book.insert(name.trim().to_string(), destination),
                Err(e) => {
                    tracing::warn!(line = number + 1, name = name.trim(), error = %e, "skipping address book entry")
                }
            }
        }
        Ok(book)
    }
}

impl Display for AddressBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, destination) in self.iter() {
            writeln!(f, "{}={}", name, destination.to_base64())?;
        }
        Ok(())
    }
}

fn default_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or_else(|| Error::InvalidConfig("no home directory for ~/.i2p/hosts.txt".into()))?;
    Ok(PathBuf::from(home).join(".i2p").join("hosts.txt"))
}
