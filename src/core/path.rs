//! Location of the credentials cache file.
//!
//! The default cache name is searched in the following order:
//!
//! 1. The override name (usually `KRB5CCNAME`), without the `FILE:` prefix.
//! 2. `/tmp/krb5cc_<uid>` on Unix systems.
//! 3. `<home>/krb5cc_<username>`.
//! 4. `<home>/krb5cc` if the username is unknown.

use log::debug;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CCACHE_FILE_PREFIX: &str = "krb5cc";
const FILE_TYPE_PREFIX: &str = "FILE:";

/// Operating system information required to build the default cache name.
pub trait SystemIdentity {
    fn is_posix_like(&self) -> bool;

    /// Identifier of the current user, if it can be retrieved.
    fn user_id(&self) -> Option<u32>;

    fn user_name(&self) -> Option<String>;

    fn home_dir(&self) -> Option<PathBuf>;

    fn current_dir(&self) -> Option<PathBuf>;
}

/// The identity of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIdentity;

impl SystemIdentity for OsIdentity {
    fn is_posix_like(&self) -> bool {
        return cfg!(unix);
    }

    #[cfg(unix)]
    fn user_id(&self) -> Option<u32> {
        return Some(users::get_current_uid());
    }

    #[cfg(not(unix))]
    fn user_id(&self) -> Option<u32> {
        return None;
    }

    fn user_name(&self) -> Option<String> {
        let username = whoami::username();
        if username.is_empty() {
            return None;
        }
        return Some(username);
    }

    fn home_dir(&self) -> Option<PathBuf> {
        return dirs::home_dir();
    }

    fn current_dir(&self) -> Option<PathBuf> {
        return env::current_dir().ok();
    }
}

/// Returns the path of the default cache file.
pub fn default_cache_name(
    override_name: Option<&str>,
    identity: &dyn SystemIdentity,
) -> PathBuf {
    if let Some(name) = override_name.map(strip_file_prefix) {
        if !name.is_empty() {
            debug!("Cache name is {}", name);
            return PathBuf::from(name);
        }
    }

    if identity.is_posix_like() {
        match identity.user_id() {
            Some(uid) => {
                let name = Path::new("/tmp")
                    .join(format!("{}_{}", CCACHE_FILE_PREFIX, uid));
                debug!("Cache name is {}", name.display());
                return name;
            }
            None => {
                debug!("Unable to get uid, using user home directory");
            }
        }
    }

    let home = identity
        .home_dir()
        .or_else(|| identity.current_dir())
        .unwrap_or_else(|| PathBuf::from("."));

    let name = match identity.user_name() {
        Some(username) => {
            home.join(format!("{}_{}", CCACHE_FILE_PREFIX, username))
        }
        None => home.join(CCACHE_FILE_PREFIX),
    };

    debug!("Cache name is {}", name.display());
    return name;
}

/// Removes the `FILE:` cache type, case insensitive. Other types are kept
/// since they are not supported.
fn strip_file_prefix(name: &str) -> &str {
    if name.len() >= FILE_TYPE_PREFIX.len()
        && name.is_char_boundary(FILE_TYPE_PREFIX.len())
        && name[..FILE_TYPE_PREFIX.len()].eq_ignore_ascii_case(FILE_TYPE_PREFIX)
    {
        return &name[FILE_TYPE_PREFIX.len()..];
    }
    return name;
}

/// Resolves the cache name into a canonical absolute path. A file that
/// does not exist yet is accepted if its parent directory exists.
pub fn check_validation(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let path = Path::new(name);
    if path.exists() {
        return fs::canonicalize(path).ok();
    }

    let file_name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let parent = fs::canonicalize(parent).ok()?;
    if !parent.is_dir() {
        return None;
    }

    return Some(parent.join(file_name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FakeIdentity {
        posix: bool,
        uid: Option<u32>,
        username: Option<String>,
        home: Option<PathBuf>,
        cwd: Option<PathBuf>,
    }

    impl Default for FakeIdentity {
        fn default() -> Self {
            return Self {
                posix: true,
                uid: Some(1000),
                username: Some("alice".into()),
                home: Some(PathBuf::from("/home/alice")),
                cwd: Some(PathBuf::from("/work")),
            };
        }
    }

    impl SystemIdentity for FakeIdentity {
        fn is_posix_like(&self) -> bool {
            return self.posix;
        }

        fn user_id(&self) -> Option<u32> {
            return self.uid;
        }

        fn user_name(&self) -> Option<String> {
            return self.username.clone();
        }

        fn home_dir(&self) -> Option<PathBuf> {
            return self.home.clone();
        }

        fn current_dir(&self) -> Option<PathBuf> {
            return self.cwd.clone();
        }
    }

    #[test]
    fn test_override_wins() {
        let identity = FakeIdentity::default();
        assert_eq!(
            PathBuf::from("/var/cc/mine"),
            default_cache_name(Some("/var/cc/mine"), &identity)
        );
        assert_eq!(
            PathBuf::from("/var/cc/mine"),
            default_cache_name(Some("FILE:/var/cc/mine"), &identity)
        );
        assert_eq!(
            PathBuf::from("/var/cc/mine"),
            default_cache_name(Some("file:/var/cc/mine"), &identity)
        );

        let identity = FakeIdentity {
            posix: false,
            uid: None,
            username: None,
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("/var/cc/mine"),
            default_cache_name(Some("FILE:/var/cc/mine"), &identity)
        );
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let identity = FakeIdentity::default();
        assert_eq!(
            PathBuf::from("/tmp/krb5cc_1000"),
            default_cache_name(Some(""), &identity)
        );
        assert_eq!(
            PathBuf::from("/tmp/krb5cc_1000"),
            default_cache_name(Some("FILE:"), &identity)
        );
    }

    #[test]
    fn test_posix_uid() {
        let identity = FakeIdentity::default();
        assert_eq!(
            PathBuf::from("/tmp/krb5cc_1000"),
            default_cache_name(None, &identity)
        );
    }

    #[test]
    fn test_posix_without_uid_uses_home() {
        let identity = FakeIdentity {
            uid: None,
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("/home/alice/krb5cc_alice"),
            default_cache_name(None, &identity)
        );
    }

    #[test]
    fn test_not_posix_uses_home() {
        let identity = FakeIdentity {
            posix: false,
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("/home/alice/krb5cc_alice"),
            default_cache_name(None, &identity)
        );

        let identity = FakeIdentity {
            posix: false,
            username: None,
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("/home/alice/krb5cc"),
            default_cache_name(None, &identity)
        );

        let identity = FakeIdentity {
            posix: false,
            home: None,
            ..Default::default()
        };
        assert_eq!(
            PathBuf::from("/work/krb5cc_alice"),
            default_cache_name(None, &identity)
        );
    }

    #[test]
    fn test_check_validation_existing_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("krb5cc_test");
        fs::write(&file, b"").unwrap();

        let resolved = check_validation(file.to_str().unwrap()).unwrap();
        assert_eq!(fs::canonicalize(&file).unwrap(), resolved);
    }

    #[test]
    fn test_check_validation_new_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("krb5cc_new");

        let resolved = check_validation(file.to_str().unwrap()).unwrap();
        assert_eq!(
            fs::canonicalize(dir.path()).unwrap().join("krb5cc_new"),
            resolved
        );
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_check_validation_missing_parent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("missing").join("krb5cc_new");
        assert_eq!(None, check_validation(file.to_str().unwrap()));
        assert_eq!(None, check_validation(""));
    }

    #[test]
    fn test_check_validation_parent_is_file() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("regular");
        fs::write(&parent, b"").unwrap();
        let file = parent.join("krb5cc_new");
        assert_eq!(None, check_validation(file.to_str().unwrap()));
    }
}
