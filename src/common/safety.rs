use std::path::{Component, Path, PathBuf};

/// System roots whose entire subtree is off limits.
const PROTECTED_ROOTS: &[&str] = &[
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/private/etc",
    "/var/db",
    "/private/var/db",
    "/var/root",
    "/private/var/root",
    "/Library/Apple",
    "/Library/Keychains",
    "/Library/Preferences",
    "/Library/Application Support/Apple",
    "/Library/Extensions",
    "/Library/Frameworks",
    "/Library/LaunchAgents",
    "/Library/LaunchDaemons",
    "/Applications/Utilities",
    "/boot",
    "/dev",
    "/lib",
    "/lib32",
    "/lib64",
    "/proc",
    "/sys",
    "/snap",
];

/// Top-level directories that must never be deleted themselves,
/// though entries below them may be.
const PROTECTED_EXACT: &[&str] = &[
    "/",
    "/Applications",
    "/Library",
    "/Library/Caches",
    "/Library/Logs",
    "/Users",
    "/Volumes",
    "/cores",
    "/home",
    "/media",
    "/mnt",
    "/opt",
    "/private",
    "/private/tmp",
    "/private/var",
    "/root",
    "/srv",
    "/tmp",
    "/var",
    "/var/log",
];

/// Home subdirectories that must never be deleted themselves
const PROTECTED_HOME_EXACT: &[&str] = &[
    "", // home dir itself
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    "Library/Caches",
    "Library/Logs",
    "Applications",
    ".Trash",
    ".cache",
    ".config",
    ".local",
    ".local/share",
    ".local/share/Trash",
    ".local/share/Trash/files",
];

/// Home subtrees that hold credentials or synced state
const PROTECTED_HOME_ROOTS: &[&str] = &[
    ".ssh",
    ".gnupg",
    "Library/Keychains",
    "Library/Preferences",
    "Library/Mobile Documents",
    "Library/Mail",
    "Library/Messages",
    "Library/IdentityServices",
];

/// Any path component containing one of these is protected,
/// wherever it lives. Lowercase; matched against lowercased names.
const SENTINEL_FRAGMENTS: &[&str] = &[
    "com.apple.",
    ".keychain",
    "identityservices",
    "corespotlight",
];

/// Decides whether a path may be deleted.
///
/// Only the path string is inspected, so the answer is the same at
/// scan time and at cleanup time unless the path itself changed.
/// Anything that cannot be judged confidently is treated as protected.
/// Matching ignores ASCII case, since `/system` and `/System` name the
/// same directory on a case-insensitive volume.
#[derive(Debug, Clone)]
pub struct PathSafetyClassifier {
    home: Option<PathBuf>,
    extra_protected: Vec<PathBuf>,
}

impl Default for PathSafetyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PathSafetyClassifier {
    /// Classifier for the current user's home directory
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
            extra_protected: Vec::new(),
        }
    }

    /// Classifier with an explicit home directory
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
            extra_protected: Vec::new(),
        }
    }

    /// Add user-configured protected prefixes
    pub fn protect<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.extra_protected
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// True when the path is eligible for deletion
    pub fn is_safe(&self, path: &Path) -> bool {
        if !is_well_formed(path) {
            return false;
        }

        if PROTECTED_ROOTS
            .iter()
            .any(|root| starts_with_ignore_case(path, Path::new(root)))
        {
            return false;
        }

        if PROTECTED_EXACT
            .iter()
            .any(|p| eq_ignore_case(path, Path::new(p)))
        {
            return false;
        }

        if self
            .extra_protected
            .iter()
            .any(|p| starts_with_ignore_case(path, p))
        {
            return false;
        }

        if let Some(home) = &self.home {
            if PROTECTED_HOME_EXACT
                .iter()
                .any(|dir| eq_ignore_case(path, &home.join(dir)))
            {
                return false;
            }

            if PROTECTED_HOME_ROOTS
                .iter()
                .any(|dir| starts_with_ignore_case(path, &home.join(dir)))
            {
                return false;
            }
        }

        !has_sentinel(path)
    }

    pub fn is_protected(&self, path: &Path) -> bool {
        !self.is_safe(path)
    }
}

/// Check a path with the default classifier
pub fn is_safe(path: &Path) -> bool {
    PathSafetyClassifier::new().is_safe(path)
}

/// Absolute, valid UTF-8, and free of `..` segments
fn is_well_formed(path: &Path) -> bool {
    if !path.is_absolute() || path.to_str().is_none() {
        return false;
    }
    path.components()
        .all(|c| !matches!(c, Component::CurDir | Component::ParentDir))
}

/// Component-wise prefix test ignoring ASCII case
fn starts_with_ignore_case(path: &Path, prefix: &Path) -> bool {
    let mut components = path.components();
    prefix.components().all(|p| {
        components
            .next()
            .is_some_and(|c| c.as_os_str().eq_ignore_ascii_case(p.as_os_str()))
    })
}

fn eq_ignore_case(a: &Path, b: &Path) -> bool {
    a.components().count() == b.components().count() && starts_with_ignore_case(a, b)
}

fn has_sentinel(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy().to_ascii_lowercase();
            SENTINEL_FRAGMENTS.iter().any(|f| name.contains(f))
        }
        _ => false,
    })
}
