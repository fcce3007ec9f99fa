//! Credentials cache stored in a file, compatible with the MIT format.
//!
//! The file is not locked, so concurrent writers from different processes
//! can overwrite each other. Inside a process every operation over the same
//! cache is serialized.

use crate::core::codec::{CCacheReader, CCacheWriter, KRB5_FCC_FVNO_3, KRB5_FCC_FVNO_4};
use crate::core::{
    check_validation, default_cache_name, Config, ConfigEntry, Credential,
    Credentials, InitialCreds, LoginOptions, OsIdentity, Principal, Record,
    Tag,
};
use crate::error::Error;
use crate::Result;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Version used for new caches.
pub const DEFAULT_VERSION: u16 = KRB5_FCC_FVNO_3;

/// Serializes the creation of cache instances.
static FACTORY_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Debug, Clone, Default)]
struct CCacheState {
    version: u16,
    tag: Option<Tag>,
    primary_principal: Option<Principal>,
    credentials: Credentials,
    config_entries: Vec<ConfigEntry>,
}

#[derive(Debug)]
pub struct FileCCache {
    cache_name: PathBuf,
    initiate_credential: Option<String>,
    state: Mutex<CCacheState>,
}

impl FileCCache {
    fn new(cache_name: PathBuf, config: &Config) -> Self {
        return Self {
            cache_name,
            initiate_credential: config.initiate_credential.clone(),
            state: Mutex::new(CCacheState::default()),
        };
    }

    /// Opens an existing cache. If the principal is given, the cache must
    /// belong to it. Any problem, such as the file not existing or
    /// containing invalid data, results in `None`.
    pub fn acquire(
        principal: Option<Principal>,
        cache: Option<&str>,
        config: &Config,
    ) -> Option<Self> {
        let _guard = FACTORY_LOCK.lock();

        let cache_name = match cache {
            Some(cache) => check_validation(cache),
            None => Some(default_cache_name(
                config.ccache_name.as_deref(),
                &OsIdentity,
            )),
        };

        let cache_name = match cache_name {
            Some(cache_name) if cache_name.exists() => cache_name,
            _ => {
                debug!("Invalid cache name or the file doesn't exist");
                return None;
            }
        };

        let ccache = Self::new(cache_name, config);
        if let Some(principal) = principal {
            ccache.state.lock().primary_principal = Some(principal);
        }

        match ccache.load() {
            Ok(()) => return Some(ccache),
            Err(err) if err.is_not_found_error() => {
                debug!("Cache {} was removed", ccache.cache_name.display());
                return None;
            }
            Err(err) => {
                debug!(
                    "Unable to load cache {}: {}",
                    ccache.cache_name.display(),
                    err
                );
                return None;
            }
        }
    }

    /// Opens the default cache.
    pub fn acquire_default(config: &Config) -> Option<Self> {
        return Self::acquire(None, None, config);
    }

    /// Creates a new empty cache for the principal, overwriting any previous
    /// file. Without name, the default cache is created.
    pub fn create(
        principal: Principal,
        name: Option<&str>,
        config: &Config,
    ) -> Result<Self> {
        let _guard = FACTORY_LOCK.lock();

        let cache_name = match name {
            Some(name) => check_validation(name)
                .ok_or_else(|| Error::InvalidPath(name.to_string()))?,
            None => default_cache_name(
                config.ccache_name.as_deref(),
                &OsIdentity,
            ),
        };

        let ccache = Self::new(cache_name, config);
        ccache.init(principal)?;
        return Ok(ccache);
    }

    pub fn cache_name(&self) -> &Path {
        return &self.cache_name;
    }

    /// Writes an empty cache for the principal and loads it. The primary
    /// principal of a cache cannot be changed once set.
    fn init(&self, principal: Principal) -> Result<()> {
        let mut state = self.state.lock();

        if let Some(primary) = &state.primary_principal {
            if !primary.matches(&principal) {
                return Err(Error::PrincipalMismatch {
                    expected: primary.to_string(),
                    found: principal.to_string(),
                });
            }
        }

        let mut writer = CCacheWriter::new(DEFAULT_VERSION);
        writer.write_header(&principal, None)?;
        self.write_file(writer.build())?;

        state.primary_principal = Some(principal);
        return self.load_state(&mut state);
    }

    /// Reads the cache file. In case the primary principal was already set,
    /// it must match the one in the file.
    pub fn load(&self) -> Result<()> {
        let mut state = self.state.lock();
        return self.load_state(&mut state);
    }

    fn load_state(&self, state: &mut CCacheState) -> Result<()> {
        let data = fs::read(&self.cache_name).map_err(|err| {
            let message = format!(
                "Unable to read the file '{}'",
                self.cache_name.display()
            );
            (message, err)
        })?;

        let mut reader = CCacheReader::new(&data);
        let version = reader.read_version()?;
        let tag = if version == KRB5_FCC_FVNO_4 {
            Some(reader.read_tag()?)
        } else {
            None
        };

        let principal = reader.read_principal()?;
        let primary_principal = match &state.primary_principal {
            Some(expected) => {
                if !expected.matches(&principal) {
                    return Err(Error::PrincipalMismatch {
                        expected: expected.to_string(),
                        found: principal.to_string(),
                    });
                }
                expected.clone()
            }
            None => principal,
        };

        let mut credentials = Credentials::empty();
        let mut config_entries = Vec::new();
        while reader.available() > 0 {
            match reader.read_record()? {
                Some(Record::Credential(cred)) => credentials.push(cred),
                Some(Record::ConfigEntry(entry)) => config_entries.push(entry),
                None => debug!("Skipping unknown record"),
            }
        }

        *state = CCacheState {
            version,
            tag,
            primary_principal: Some(primary_principal),
            credentials,
            config_entries,
        };

        return Ok(());
    }

    /// Writes the cache into the file, replacing the previous content.
    pub fn save(&self) -> Result<()> {
        let state = self.state.lock();

        let primary = state.primary_principal.as_ref().ok_or_else(|| {
            Error::DataError("Unable to save a cache without principal".into())
        })?;

        let mut writer = CCacheWriter::new(state.version);
        writer.write_header(primary, state.tag.as_ref())?;
        for cred in state.credentials.iter() {
            writer.write_credential(cred)?;
        }
        for entry in state.config_entries.iter() {
            writer.write_config_entry(primary, entry)?;
        }

        return self.write_file(writer.build());
    }

    fn write_file(&self, raw: Vec<u8>) -> Result<()> {
        fs::write(&self.cache_name, raw).map_err(|err| {
            let message = format!(
                "Unable to write credentials in file {}",
                self.cache_name.display()
            );
            (message, err)
        })?;
        return Ok(());
    }

    /// Adds the credential, replacing the older ones for the same service.
    /// The change is not saved to the file.
    pub fn update(&self, cred: Credential) {
        self.state.lock().credentials.update(cred);
    }

    pub fn primary_principal(&self) -> Option<Principal> {
        return self.state.lock().primary_principal.clone();
    }

    pub fn version(&self) -> u16 {
        return self.state.lock().version;
    }

    pub fn tag(&self) -> Option<Tag> {
        return self.state.lock().tag.clone();
    }

    /// Snapshot of the credentials, `None` if there are none.
    pub fn creds_list(&self) -> Option<Credentials> {
        let state = self.state.lock();
        if state.credentials.is_empty() {
            return None;
        }
        return Some(state.credentials.clone());
    }

    pub fn get_creds(
        &self,
        sname: &Principal,
        options: Option<&LoginOptions>,
    ) -> Option<Credential> {
        let creds = self.creds_list()?;
        return creds.look_for_service(sname, options).cloned();
    }

    /// The TGT of the cache realm, preferring the latest added.
    pub fn get_default_creds(&self) -> Option<Credential> {
        let creds = self.creds_list()?;
        return creds.default_tgt().cloned();
    }

    /// The credential to initiate a security context, which may be an
    /// impersonated one. Fails only if the impersonation policy setting is
    /// invalid.
    pub fn get_initial_creds(&self) -> Result<Option<InitialCreds>> {
        let state = self.state.lock();
        let primary = match &state.primary_principal {
            Some(primary) => primary,
            None => return Ok(None),
        };

        return state.credentials.initial_creds(
            primary,
            &state.config_entries,
            self.initiate_credential.as_deref(),
        );
    }

    pub fn add_config_entry(&self, entry: ConfigEntry) {
        self.state.lock().config_entries.push(entry);
    }

    pub fn config_entries(&self) -> Vec<ConfigEntry> {
        return self.state.lock().config_entries.clone();
    }

    /// First config entry with the given name.
    pub fn get_config_entry(&self, name: &str) -> Option<ConfigEntry> {
        return self
            .state
            .lock()
            .config_entries
            .iter()
            .find(|e| e.name == name)
            .cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::{KRB5_FCC_FVNO_1, KRB5_FCC_FVNO_2};
    use crate::core::test_utils::new_cred;
    use crate::core::{new_nt_principal, new_nt_srv_inst, PROXY_IMPERSONATOR};
    use std::sync::Arc;
    use std::thread;
    use tempfile::{tempdir, TempDir};

    fn cache_path(dir: &TempDir) -> String {
        return dir.path().join("krb5cc_test").to_str().unwrap().to_string();
    }

    fn write_cache(
        path: &str,
        version: u16,
        tag: Option<&Tag>,
        primary: &Principal,
        creds: &[Credential],
        entries: &[ConfigEntry],
    ) {
        let mut writer = CCacheWriter::new(version);
        writer.write_header(primary, tag).unwrap();
        for cred in creds {
            writer.write_credential(cred).unwrap();
        }
        for entry in entries {
            writer.write_config_entry(primary, entry).unwrap();
        }
        fs::write(path, writer.build()).unwrap();
    }

    #[test]
    fn test_create_and_acquire() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let config = Config::new();

        let ccache =
            FileCCache::create(primary.clone(), Some(&path), &config).unwrap();
        assert_eq!(Some(primary.clone()), ccache.primary_principal());
        assert_eq!(DEFAULT_VERSION, ccache.version());
        assert_eq!(None, ccache.tag());
        assert_eq!(None, ccache.creds_list());

        let ccache = FileCCache::acquire(None, Some(&path), &config).unwrap();
        assert_eq!(Some(primary), ccache.primary_principal());
        assert!(ccache.cache_name().is_absolute());
    }

    #[test]
    fn test_create_invalid_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("krb5cc");
        let result = FileCCache::create(
            new_nt_principal("alice", "A"),
            Some(path.to_str().unwrap()),
            &Config::new(),
        );
        assert!(matches!(result, Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_acquire_missing_file() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        assert!(FileCCache::acquire(None, Some(&path), &Config::new()).is_none());
    }

    #[test]
    fn test_acquire_default_uses_override() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        write_cache(&path, KRB5_FCC_FVNO_4, None, &primary, &[], &[]);

        let config = Config::new().ccache_name(Some(format!("FILE:{}", path)));
        let ccache = FileCCache::acquire_default(&config).unwrap();
        assert_eq!(Some(primary), ccache.primary_principal());
    }

    #[test]
    fn test_acquire_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        fs::write(&path, b"\x05\x04\x00").unwrap();
        assert!(FileCCache::acquire(None, Some(&path), &Config::new()).is_none());

        let primary = new_nt_principal("alice", "A");
        write_cache(&path, KRB5_FCC_FVNO_3, None, &primary, &[], &[]);
        let mut data = fs::read(&path).unwrap();
        data.extend_from_slice(&[0, 0, 0]);
        fs::write(&path, data).unwrap();
        assert!(FileCCache::acquire(None, Some(&path), &Config::new()).is_none());
    }

    #[test]
    fn test_principal_mismatch() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        write_cache(&path, KRB5_FCC_FVNO_4, None, &primary, &[], &[]);

        let config = Config::new();
        let other = new_nt_principal("bob", "A");
        assert!(FileCCache::acquire(Some(other), Some(&path), &config).is_none());

        let same = new_nt_principal("ALICE", "a");
        let ccache =
            FileCCache::acquire(Some(same.clone()), Some(&path), &config).unwrap();
        assert_eq!(Some(same), ccache.primary_principal());

        ccache.state.lock().primary_principal =
            Some(new_nt_principal("bob", "A"));
        match ccache.load() {
            Err(Error::PrincipalMismatch { expected, found }) => {
                assert_eq!("bob@A", expected);
                assert_eq!("alice@A", found);
            }
            other => panic!("Unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let creds = vec![
            new_cred("alice", "A", "krbtgt/A", "A", 1000),
            new_cred("alice", "A", "cifs/srv", "A", 2000),
            new_cred("alice", "A", "krbtgt/B", "A", 3000),
        ];
        let entries = vec![
            ConfigEntry::new("pa_type".into(), None, b"2".to_vec()),
            ConfigEntry::new(
                "fast_avail".into(),
                Some(new_nt_srv_inst("krbtgt/A", "A")),
                b"yes".to_vec(),
            ),
        ];
        let tag = Tag::with_time_offset(-30, 5);
        write_cache(&path, KRB5_FCC_FVNO_4, Some(&tag), &primary, &creds, &entries);

        let config = Config::new();
        let ccache = FileCCache::acquire(None, Some(&path), &config).unwrap();
        ccache.update(new_cred("alice", "A", "http/web", "A", 4000));
        ccache.add_config_entry(ConfigEntry::new(
            "pa_type".into(),
            None,
            b"3".to_vec(),
        ));
        ccache.save().unwrap();

        let reloaded = FileCCache::acquire(None, Some(&path), &config).unwrap();
        assert_eq!(ccache.creds_list(), reloaded.creds_list());
        assert_eq!(ccache.config_entries(), reloaded.config_entries());
        assert_eq!(ccache.primary_principal(), reloaded.primary_principal());
        assert_eq!(KRB5_FCC_FVNO_4, reloaded.version());
        assert_eq!(Some(tag), reloaded.tag());
        assert_eq!(4, reloaded.creds_list().unwrap().len());
        assert_eq!(3, reloaded.config_entries().len());
        assert_eq!(
            Some(b"2".to_vec()),
            reloaded.get_config_entry("pa_type").map(|e| e.data)
        );
    }

    #[test]
    fn test_round_trip_old_versions() {
        let primary = new_nt_principal("alice", "A");
        let creds = vec![new_cred("alice", "A", "krbtgt/A", "A", 1000)];

        for version in &[KRB5_FCC_FVNO_1, KRB5_FCC_FVNO_2, KRB5_FCC_FVNO_3] {
            let dir = tempdir().unwrap();
            let path = cache_path(&dir);
            write_cache(&path, *version, None, &primary, &creds, &[]);
            let original = fs::read(&path).unwrap();

            let ccache = FileCCache::acquire(None, Some(&path), &Config::new())
                .unwrap();
            assert_eq!(*version, ccache.version());
            assert_eq!(None, ccache.tag());
            ccache.save().unwrap();
            assert_eq!(original, fs::read(&path).unwrap());
        }
    }

    #[test]
    fn test_update_is_not_saved() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let config = Config::new();
        let ccache = FileCCache::create(primary, Some(&path), &config).unwrap();

        ccache.update(new_cred("alice", "A", "krbtgt/A", "A", 1000));
        assert_eq!(1, ccache.creds_list().unwrap().len());

        let other = FileCCache::acquire(None, Some(&path), &config).unwrap();
        assert_eq!(None, other.creds_list());

        ccache.save().unwrap();
        other.load().unwrap();
        assert_eq!(1, other.creds_list().unwrap().len());
    }

    #[test]
    fn test_save_rejects_unencodable_time() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let config = Config::new();
        let ccache = FileCCache::create(primary, Some(&path), &config).unwrap();
        let empty = fs::read(&path).unwrap();

        ccache.update(new_cred("alice", "A", "krbtgt/A", "A", 5_000_000_000));
        assert!(ccache.save().unwrap_err().is_data_error());
        assert_eq!(empty, fs::read(&path).unwrap());
    }

    #[test]
    fn test_init_keeps_primary_principal() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let alice = new_nt_principal("alice", "A");
        let config = Config::new();
        let ccache =
            FileCCache::create(alice.clone(), Some(&path), &config).unwrap();
        ccache.update(new_cred("alice", "A", "krbtgt/A", "A", 1000));

        match ccache.init(new_nt_principal("bob", "B")) {
            Err(Error::PrincipalMismatch { expected, found }) => {
                assert_eq!("alice@A", expected);
                assert_eq!("bob@B", found);
            }
            other => panic!("Unexpected result {:?}", other),
        }
        assert_eq!(Some(alice.clone()), ccache.primary_principal());
        assert_eq!(1, ccache.creds_list().unwrap().len());

        ccache.init(alice.clone()).unwrap();
        assert_eq!(Some(alice), ccache.primary_principal());
        assert_eq!(None, ccache.creds_list());
    }

    #[test]
    fn test_get_creds_and_default() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let creds = vec![
            new_cred("alice", "A", "krbtgt/A", "A", 1000),
            new_cred("alice", "A", "krbtgt/B", "A", 3000),
            new_cred("alice", "A", "krbtgt/A", "A", 2000),
        ];
        write_cache(&path, KRB5_FCC_FVNO_4, None, &primary, &creds, &[]);

        let ccache =
            FileCCache::acquire(None, Some(&path), &Config::new()).unwrap();

        let tgt = ccache.get_default_creds().unwrap();
        assert_eq!(creds[2], tgt);

        let sname = new_nt_srv_inst("krbtgt/a", "a");
        assert_eq!(Some(creds[0].clone()), ccache.get_creds(&sname, None));

        let sname = new_nt_srv_inst("cifs/srv", "A");
        assert_eq!(None, ccache.get_creds(&sname, None));
    }

    #[test]
    fn test_initial_creds_from_file() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("bob", "A");
        let creds = vec![new_cred("svc", "A", "krbtgt/A", "A", 5000)];
        let entries = vec![ConfigEntry::new(
            PROXY_IMPERSONATOR.into(),
            None,
            b"svc@A".to_vec(),
        )];
        write_cache(&path, KRB5_FCC_FVNO_4, None, &primary, &creds, &entries);

        let config = Config::new()
            .initiate_credential(Some("try-impersonate".into()));
        let ccache = FileCCache::acquire(None, Some(&path), &config).unwrap();
        let initial = ccache.get_initial_creds().unwrap().unwrap();
        assert!(!initial.is_impersonated());

        let config = Config::new();
        let ccache = FileCCache::acquire(None, Some(&path), &config).unwrap();
        assert_eq!(None, ccache.get_initial_creds().unwrap());

        ccache.update(new_cred("bob", "A", "svc", "A", 5000));
        let initial = ccache.get_initial_creds().unwrap().unwrap();
        assert!(initial.is_impersonated());

        let config = Config::new().initiate_credential(Some("never".into()));
        let ccache = FileCCache::acquire(None, Some(&path), &config).unwrap();
        assert!(matches!(
            ccache.get_initial_creds(),
            Err(Error::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_concurrent_updates() {
        let dir = tempdir().unwrap();
        let path = cache_path(&dir);
        let primary = new_nt_principal("alice", "A");
        let ccache = Arc::new(
            FileCCache::create(primary, Some(&path), &Config::new()).unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ccache = Arc::clone(&ccache);
                thread::spawn(move || {
                    for j in 0..50 {
                        let service = format!("host/srv{}", i);
                        ccache.update(new_cred("alice", "A", &service, "A", j));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let creds = ccache.creds_list().unwrap();
        assert_eq!(8, creds.len());
        assert!(creds.iter().all(|c| c.endtime().timestamp() == 49));
    }
}
