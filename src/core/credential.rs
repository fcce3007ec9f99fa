//! Records stored in a credentials cache: tickets and config entries.

use crate::core::principal::{eq_ignore_case, name_strings_match};
use crate::core::{Principal, TicketFlags};
use chrono::{DateTime, Utc};

/// Session key of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyBlock {
    pub keytype: u16,
    pub keyvalue: Vec<u8>,
}

impl KeyBlock {
    pub fn new(keytype: u16, keyvalue: Vec<u8>) -> Self {
        return Self { keytype, keyvalue };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub addrtype: u16,
    pub addrdata: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    pub ad_type: u16,
    pub ad_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Times {
    pub authtime: DateTime<Utc>,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub renew_till: DateTime<Utc>,
}

/// A ticket with the client info required to use it. The ticket itself is
/// kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub client: Principal,
    pub server: Principal,
    pub key: KeyBlock,
    pub times: Times,
    pub is_skey: bool,
    pub flags: TicketFlags,
    pub addresses: Vec<Address>,
    pub auth_data: Vec<AuthData>,
    pub ticket: Vec<u8>,
    pub second_ticket: Vec<u8>,
}

impl Credential {
    pub fn endtime(&self) -> &DateTime<Utc> {
        return &self.times.endtime;
    }

    /// Two credentials are for the same service when the service names and
    /// realms are equal, ignoring case.
    pub fn same_service(&self, other: &Credential) -> bool {
        return name_strings_match(
            self.server.name_strings(),
            other.server.name_strings(),
        ) && eq_ignore_case(&self.server.realm, &other.server.realm);
    }
}

/// Auxiliary data stored in the cache under a reserved service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub principal: Option<Principal>,
    pub data: Vec<u8>,
}

impl ConfigEntry {
    pub fn new(name: String, principal: Option<Principal>, data: Vec<u8>) -> Self {
        return Self {
            name,
            principal,
            data,
        };
    }
}

/// The credential used to start a security context: the user TGT and, in
/// case of impersonation, the evidence ticket of the impersonated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialCreds {
    pub tgt: Credential,
    pub proxy: Option<Credential>,
}

impl InitialCreds {
    pub fn new(tgt: Credential) -> Self {
        return Self { tgt, proxy: None };
    }

    pub fn with_proxy(tgt: Credential, proxy: Credential) -> Self {
        return Self {
            tgt,
            proxy: Some(proxy),
        };
    }

    pub fn is_impersonated(&self) -> bool {
        return self.proxy.is_some();
    }

    /// Principal on whose behalf the credential acts.
    pub fn client(&self) -> &Principal {
        match &self.proxy {
            Some(proxy) => return &proxy.client,
            None => return &self.tgt.client,
        }
    }
}
