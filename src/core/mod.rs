mod principal;
pub use principal::{
    eq_ignore_case, name_strings_match, new_nt_principal, new_nt_srv_inst,
    Principal, TGS_NAME,
};

mod flags;
pub use flags::{LoginOptions, TicketFlags};

mod credential;
pub use credential::{
    Address, AuthData, ConfigEntry, Credential, InitialCreds, KeyBlock, Times,
};

pub mod codec;
pub use codec::{Record, Tag, TagField};

mod config;
pub use config::{Config, ImpersonationPolicy, CCACHE_ENVVAR, POLICY_ENVVAR};

pub mod path;
pub use path::{
    check_validation, default_cache_name, OsIdentity, SystemIdentity,
};

mod creds;
pub use creds::{Credentials, PROXY_IMPERSONATOR};

mod ccache;
pub use ccache::FileCCache;

pub mod stringifier;
