//! Ordered list of cache credentials and the rules to merge and select them.

use crate::core::{
    eq_ignore_case, ConfigEntry, Credential, ImpersonationPolicy, InitialCreds,
    LoginOptions, Principal,
};
use crate::error::Error;
use crate::Result;
use log::debug;
use std::slice::Iter;

/// Config entry that names the impersonator of an S4U2Self cache.
pub const PROXY_IMPERSONATOR: &str = "proxy_impersonator";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub creds: Vec<Credential>,
}

impl Credentials {
    pub fn new(creds: Vec<Credential>) -> Self {
        return Self { creds };
    }

    pub fn empty() -> Self {
        return Self::default();
    }

    pub fn push(&mut self, cred: Credential) {
        self.creds.push(cred);
    }

    pub fn iter(&self) -> Iter<'_, Credential> {
        return self.creds.iter();
    }

    pub fn len(&self) -> usize {
        return self.creds.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.creds.is_empty();
    }

    pub fn get(&self, index: usize) -> Option<&Credential> {
        return self.creds.get(index);
    }

    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&Credential) -> bool,
    {
        self.iter()
            .filter(|c| predicate(c))
            .cloned()
            .collect::<Vec<Credential>>()
            .into()
    }

    /// Filter credentials for the service realm. Case insensitive.
    pub fn srealm(&self, realm: &str) -> Self {
        self.filter(|c| eq_ignore_case(&c.server.realm, realm))
    }

    /// Filter to only return TGTs, including referral ones.
    pub fn tgt(&self) -> Self {
        self.filter(|c| {
            c.server
                .components
                .first()
                .map(|s| s.eq_ignore_ascii_case(crate::core::TGS_NAME))
                .unwrap_or(false)
        })
    }

    /// Merges a credential into the list. The credential replaces the ones
    /// for the same service that do not expire later. If there is no ticket
    /// for the service, it is appended.
    ///
    /// Matches are evaluated against the list before any change, and the
    /// new credential is appended once at the end.
    pub fn update(&mut self, cred: Credential) {
        if self.creds.is_empty() {
            self.creds.push(cred);
            return;
        }

        let matched = self.creds.iter().any(|c| c.same_service(&cred));

        if !matched {
            debug!("Ticket not exactly matched, add new one into cache");
            self.creds.push(cred);
            return;
        }

        let previous_len = self.creds.len();
        self.creds
            .retain(|c| !(c.same_service(&cred) && cred.endtime() >= c.endtime()));

        if self.creds.len() != previous_len {
            debug!("Ticket matched, overwrite the old one");
            self.creds.push(cred);
        } else {
            debug!("Ticket matched but a newer one is already in cache");
        }
    }

    /// First credential for a service, in insertion order. With options the
    /// ticket flags must also match them.
    pub fn look_for_service(
        &self,
        sname: &Principal,
        options: Option<&LoginOptions>,
    ) -> Option<&Credential> {
        return self.iter().find(|c| {
            if !sname.matches(&c.server) {
                return false;
            }
            match options {
                Some(options) => c.flags.matches(options),
                None => true,
            }
        });
    }

    /// The TGT for the realm of its own service (krbtgt/REALM@REALM). The
    /// latest added credentials are checked first.
    pub fn default_tgt(&self) -> Option<&Credential> {
        return self.iter().rev().find(|c| c.server.is_local_tgs());
    }

    /// First credential with exactly the given client and service.
    pub fn look_for_user_creds(
        &self,
        client: &Principal,
        service: &Principal,
    ) -> Option<&Credential> {
        return self
            .iter()
            .find(|c| &c.client == client && &c.server == service);
    }

    /// Resolves the credential used to initiate a security context. If the
    /// cache belongs to an impersonated user, the impersonator TGT is
    /// returned together with the evidence ticket, depending on the policy.
    ///
    /// Only an invalid policy setting returns an error.
    pub fn initial_creds(
        &self,
        primary: &Principal,
        config_entries: &[ConfigEntry],
        policy_setting: Option<&str>,
    ) -> Result<Option<InitialCreds>> {
        let tgt = match self.default_tgt() {
            Some(tgt) => tgt.clone(),
            None => return Ok(None),
        };

        let entry = match config_entries
            .iter()
            .find(|e| e.name == PROXY_IMPERSONATOR)
        {
            Some(entry) => entry,
            None => {
                debug!("Get normal credential");
                return Ok(Some(InitialCreds::new(tgt)));
            }
        };

        let force = match ImpersonationPolicy::from_setting(policy_setting)? {
            ImpersonationPolicy::NoImpersonate => {
                debug!("Get normal credential");
                return Ok(Some(InitialCreds::new(tgt)));
            }
            ImpersonationPolicy::TryImpersonate => false,
            ImpersonationPolicy::AlwaysImpersonate => true,
        };

        match self.look_for_proxy(&tgt, primary, entry) {
            Ok(proxy) => {
                debug!("Get proxied credential");
                return Ok(Some(InitialCreds::with_proxy(tgt, proxy)));
            }
            Err(err) => {
                debug!("{}", err);
                if force {
                    return Ok(None);
                }
                return Ok(Some(InitialCreds::new(tgt)));
            }
        }
    }

    /// Looks for the evidence ticket: the primary principal ticket for the
    /// impersonator service, which must be the TGT client.
    fn look_for_proxy(
        &self,
        tgt: &Credential,
        primary: &Principal,
        entry: &ConfigEntry,
    ) -> Result<Credential> {
        let name = String::from_utf8(entry.data.clone()).map_err(|_| {
            Error::Impersonation(format!("{} is not valid UTF-8", entry.name))
        })?;

        let service: Principal = name.parse().map_err(|err| {
            Error::Impersonation(format!("{}: {}", entry.name, err))
        })?;

        if tgt.client != service {
            return Err(Error::Impersonation(format!(
                "{} does not match service name",
                entry.name
            )));
        }

        return self
            .look_for_user_creds(primary, &service)
            .cloned()
            .ok_or_else(|| {
                Error::Impersonation(
                    "Cannot find evidence ticket in ccache".into(),
                )
            });
    }
}

impl From<Vec<Credential>> for Credentials {
    fn from(v: Vec<Credential>) -> Self {
        return Self::new(v);
    }
}

impl From<Credential> for Credentials {
    fn from(cred: Credential) -> Self {
        return Self::new(vec![cred]);
    }
}
