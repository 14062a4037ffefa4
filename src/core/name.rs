use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A library or file name as written by the tool or the filesystem.
///
/// Equality, ordering and hashing use the case-folded form, so `KERNEL32.dll`
/// and `kernel32.DLL` are the same library. The original spelling is kept for
/// display.
#[derive(Debug, Clone)]
pub struct DllName {
    display: String,
    key: String,
}

impl DllName {
    pub fn new(name: impl Into<String>) -> Self {
        let display = name.into();
        let key = display.to_lowercase();
        Self { display, key }
    }

    /// The spelling this name was created with.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_extension(&self) -> bool {
        self.display.contains('.')
    }

    /// Same name with `.dll` appended, used when a dump omits the extension.
    pub fn with_dll_extension(&self) -> Self {
        Self::new(format!("{}.dll", self.display))
    }

    pub fn ends_with_ignore_case(&self, suffix: &str) -> bool {
        self.key.ends_with(&suffix.to_lowercase())
    }
}

impl PartialEq for DllName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for DllName {}

impl Hash for DllName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for DllName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DllName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for DllName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for DllName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DllName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_compare_case_insensitively() {
        let a = DllName::new("KERNEL32.dll");
        let b = DllName::new("kernel32.DLL");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "KERNEL32.dll");

        let set: HashSet<DllName> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn extension_detection() {
        assert!(DllName::new("user32.dll").has_extension());
        let bare = DllName::new("KERNEL32");
        assert!(!bare.has_extension());
        assert_eq!(bare.with_dll_extension().as_str(), "KERNEL32.dll");
    }
}
