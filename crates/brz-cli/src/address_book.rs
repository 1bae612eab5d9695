//! Contact list persistence.
//!
//! The contact list is the set of bridge endpoints this client has loaded or
//! connected to. With `--addr` it is loaded before the session opens and its
//! entries are tried as endpoints; with `--save_addr` it is written back
//! after a successful command. One address per line; blank lines and `#`
//! comments are ignored on load.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CliError;

/// Set of known peer addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactList {
    addresses: BTreeSet<String>,
}

impl ContactList {
    /// Create an empty contact list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address. Returns `true` if it was not already known.
    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        let address = address.trim();
        if address.is_empty() {
            return false;
        }
        self.addresses.insert(address.to_string())
    }

    /// Check whether an address is known.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    /// Number of known addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether no address is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Iterate over addresses in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }

    /// Parse a contact list from file content.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut list = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            list.insert(line);
        }
        list
    }

    /// Render the list in its file format.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for address in &self.addresses {
            out.push_str(address);
            out.push('\n');
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for ContactList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for address in iter {
            list.insert(address);
        }
        list
    }
}

/// Load a contact list, replacing whatever the caller had.
///
/// # Errors
///
/// Returns [`CliError::FileAccess`] if the file is missing or unreadable.
pub fn load(path: &Path) -> Result<ContactList, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let list = ContactList::parse(&content);
    debug!(path = %path.display(), count = list.len(), "loaded contact list");
    Ok(list)
}

/// Save a contact list, overwriting any existing file.
///
/// The list is written to a temporary file in the same directory and
/// persisted over `path`, so a reader never sees a partial list. The
/// temporary file is removed if any step fails.
///
/// # Errors
///
/// Returns [`CliError::FileAccess`] if the file cannot be written.
pub fn save(path: &Path, list: &ContactList) -> Result<(), CliError> {
    let file_access = |source| CliError::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(dir).map_err(file_access)?;
    staging
        .write_all(list.render().as_bytes())
        .map_err(file_access)?;
    staging.as_file().sync_all().map_err(file_access)?;
    staging.persist(path).map_err(|e| file_access(e.error))?;

    debug!(path = %path.display(), count = list.len(), "saved contact list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brzaddr.tmp");

        let list: ContactList = ["ws://10.0.0.2:7400", "ws://10.0.0.1:7400"]
            .into_iter()
            .collect();
        save(&path, &list).expect("save");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded, list);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brzaddr.tmp");

        save(&path, &["ws://old:1"].into_iter().collect()).expect("save old");
        save(&path, &["ws://new:1"].into_iter().collect()).expect("save new");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("ws://new:1"));
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
    }

    #[test]
    fn test_failed_save_leaves_no_stray_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory in the way makes the final rename fail.
        let path = dir.path().join("brzaddr.tmp");
        std::fs::create_dir(&path).expect("blocking dir");
        std::fs::write(path.join("keep"), "x").expect("fill blocking dir");

        let err = save(&path, &["ws://a:1"].into_iter().collect()).unwrap_err();
        assert!(matches!(err, CliError::FileAccess { .. }));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("brzaddr.tmp")]);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = save(
            &dir.path().join("absent").join("brzaddr.tmp"),
            &ContactList::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::FileAccess { .. }));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, CliError::FileAccess { .. }));
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        let list = ContactList::parse("# bridges\n\n  ws://a:1  \nws://b:2\nws://a:1\n");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["ws://a:1", "ws://b:2"]);
    }

    #[test]
    fn test_insert_ignores_blank_and_duplicates() {
        let mut list = ContactList::new();
        assert!(list.insert("ws://a:1"));
        assert!(!list.insert("ws://a:1"));
        assert!(!list.insert("   "));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(ContactList::new().render(), "");
        assert!(ContactList::parse("").is_empty());
    }
}
