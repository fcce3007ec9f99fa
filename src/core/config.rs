use crate::error::Error;
use crate::Result;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable with the name of the credentials cache.
pub const CCACHE_ENVVAR: &str = "KRB5CCNAME";

/// Environment variable that selects which credential is used to initiate
/// a security context when the cache contains an impersonation ticket.
pub const POLICY_ENVVAR: &str = "KRB5_DEFAULT_INITIATE_CREDENTIAL";

/// How the initial credential is resolved when the cache has a
/// `proxy_impersonator` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationPolicy {
    /// Always use the plain TGT.
    NoImpersonate,
    /// Use the impersonated credential, fall back to the plain TGT.
    TryImpersonate,
    /// Use the impersonated credential or nothing.
    AlwaysImpersonate,
}

impl ImpersonationPolicy {
    /// Parses an optional setting, unset means `always-impersonate`.
    pub fn from_setting(setting: Option<&str>) -> Result<Self> {
        match setting {
            Some(value) => return value.parse(),
            None => return Ok(Self::AlwaysImpersonate),
        }
    }
}

impl Default for ImpersonationPolicy {
    fn default() -> Self {
        return Self::AlwaysImpersonate;
    }
}

impl FromStr for ImpersonationPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "no-impersonate" => return Ok(Self::NoImpersonate),
            "try-impersonate" => return Ok(Self::TryImpersonate),
            "always-impersonate" => return Ok(Self::AlwaysImpersonate),
            _ => return Err(Error::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ImpersonationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoImpersonate => write!(f, "no-impersonate"),
            Self::TryImpersonate => write!(f, "try-impersonate"),
            Self::AlwaysImpersonate => write!(f, "always-impersonate"),
        }
    }
}

/// External settings consumed by the cache. The values are kept raw, the
/// policy is only validated when it is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub ccache_name: Option<String>,
    pub initiate_credential: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn from_env() -> Self {
        return Self {
            ccache_name: env::var(CCACHE_ENVVAR).ok(),
            initiate_credential: env::var(POLICY_ENVVAR).ok(),
        };
    }

    pub fn ccache_name(mut self, name: Option<String>) -> Self {
        if name.is_some() {
            self.ccache_name = name;
        }
        return self;
    }

    pub fn initiate_credential(mut self, policy: Option<String>) -> Self {
        if policy.is_some() {
            self.initiate_credential = policy;
        }
        return self;
    }
}
