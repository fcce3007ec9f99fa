//! Binary layout of the file credentials cache, versions 1 to 4.
//!
//! The file starts with a 16-bit version, followed (only in version 4) by a
//! block of header tags and then the primary principal. After that comes a
//! sequence of credential records until the end of the file. Config entries
//! are stored as credentials for a reserved service name.

use crate::core::{
    Address, AuthData, ConfigEntry, Credential, KeyBlock, Principal,
    TicketFlags, Times,
};
use crate::error::Error;
use crate::Result;
use chrono::{DateTime, TimeZone, Utc};
use kerberos_constants::principal_names;
use std::convert::TryFrom;
use std::time::UNIX_EPOCH;

pub const KRB5_FCC_FVNO_1: u16 = 0x0501;
pub const KRB5_FCC_FVNO_2: u16 = 0x0502;
pub const KRB5_FCC_FVNO_3: u16 = 0x0503;
pub const KRB5_FCC_FVNO_4: u16 = 0x0504;

/// Header tag that stores the KDC time offset.
pub const FCC_TAG_DELTATIME: u16 = 1;

pub const CONF_REALM: &str = "X-CACHECONF:";
pub const CONF_NAME: &str = "krb5_ccache_conf_data";

pub fn is_known_version(version: u16) -> bool {
    return version >= KRB5_FCC_FVNO_1 && version <= KRB5_FCC_FVNO_4;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteOrder {
    Big,
    Native,
}

impl ByteOrder {
    fn for_version(version: u16) -> Self {
        if version == KRB5_FCC_FVNO_1 || version == KRB5_FCC_FVNO_2 {
            return Self::Native;
        }
        return Self::Big;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagField {
    pub tag: u16,
    pub data: Vec<u8>,
}

/// Header tags of a version 4 cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub fields: Vec<TagField>,
}

impl Tag {
    pub fn new(fields: Vec<TagField>) -> Self {
        return Self { fields };
    }

    pub fn with_time_offset(seconds: i32, microseconds: i32) -> Self {
        let mut data = seconds.to_be_bytes().to_vec();
        data.extend_from_slice(&microseconds.to_be_bytes());
        return Self::new(vec![TagField {
            tag: FCC_TAG_DELTATIME,
            data,
        }]);
    }

    /// KDC time offset as (seconds, microseconds), if stored.
    pub fn time_offset(&self) -> Option<(i32, i32)> {
        let field = self.fields.iter().find(|f| f.tag == FCC_TAG_DELTATIME)?;
        if field.data.len() != 8 {
            return None;
        }
        let mut seconds = [0u8; 4];
        let mut microseconds = [0u8; 4];
        seconds.copy_from_slice(&field.data[0..4]);
        microseconds.copy_from_slice(&field.data[4..8]);
        return Some((i32::from_be_bytes(seconds), i32::from_be_bytes(microseconds)));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Credential(Credential),
    ConfigEntry(ConfigEntry),
}

/// Reads the cache items from the raw file content.
pub struct CCacheReader<'a> {
    raw: &'a [u8],
    position: usize,
    version: u16,
    byte_order: ByteOrder,
}

impl<'a> CCacheReader<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        return Self {
            raw,
            position: 0,
            version: KRB5_FCC_FVNO_4,
            byte_order: ByteOrder::Big,
        };
    }

    /// Remaining bytes to read.
    pub fn available(&self) -> usize {
        return self.raw.len() - self.position;
    }

    pub fn read_version(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        let version = u16::from_be_bytes([raw[0], raw[1]]);
        if !is_known_version(version) {
            return Err(Error::DataError(format!(
                "Unknown ccache version {:#06x}",
                version
            )));
        }
        self.version = version;
        self.byte_order = ByteOrder::for_version(version);
        return Ok(version);
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        let header_len = self.read_u16()? as usize;
        let header = self.take(header_len)?;
        let mut fields = Vec::new();
        let mut tag_reader = CCacheReader::new(header);

        while tag_reader.available() > 0 {
            let tag = tag_reader.read_u16()?;
            let len = tag_reader.read_u16()? as usize;
            let data = tag_reader.take(len)?.to_vec();
            fields.push(TagField { tag, data });
        }

        return Ok(Tag::new(fields));
    }

    pub fn read_principal(&mut self) -> Result<Principal> {
        let name_type;
        let num_components;
        if self.version == KRB5_FCC_FVNO_1 {
            // the count includes the realm
            name_type = principal_names::NT_UNKNOWN;
            num_components =
                self.read_u32()?.checked_sub(1).ok_or_else(|| {
                    Error::DataError("Invalid principal components count".into())
                })?;
        } else {
            name_type = self.read_u32()? as i32;
            num_components = self.read_u32()?;
        }

        let realm = self.read_string()?;
        let mut components = Vec::new();
        for _ in 0..num_components {
            components.push(self.read_string()?);
        }

        return Ok(Principal::new(name_type, components, realm));
    }

    /// Reads a credential record. Records that are neither a ticket nor a
    /// config entry are consumed and `None` is returned.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let client = self.read_principal()?;
        let server = self.read_principal()?;
        let key = self.read_key()?;
        let times = self.read_times()?;
        let is_skey = self.read_u8()? != 0;
        let flags = TicketFlags::new(self.read_u32()?);
        let addresses = self.read_addresses()?;
        let auth_data = self.read_auth_data()?;
        let ticket = self.read_data()?;
        let second_ticket = self.read_data()?;

        if server.realm == CONF_REALM
            && server.components.first().map(|c| c.as_str()) == Some(CONF_NAME)
        {
            return Ok(config_entry_from_server(&server, ticket)
                .map(Record::ConfigEntry));
        }

        if ticket.is_empty() {
            return Ok(None);
        }

        return Ok(Some(Record::Credential(Credential {
            client,
            server,
            key,
            times,
            is_skey,
            flags,
            addresses,
            auth_data,
            ticket,
            second_ticket,
        })));
    }

    fn read_key(&mut self) -> Result<KeyBlock> {
        let keytype = self.read_u16()?;
        if self.version == KRB5_FCC_FVNO_3 {
            // version 3 stores the enctype twice
            self.read_u16()?;
        }
        let keyvalue = self.read_data()?;
        return Ok(KeyBlock::new(keytype, keyvalue));
    }

    fn read_times(&mut self) -> Result<Times> {
        return Ok(Times {
            authtime: self.read_time()?,
            starttime: self.read_time()?,
            endtime: self.read_time()?,
            renew_till: self.read_time()?,
        });
    }

    fn read_time(&mut self) -> Result<DateTime<Utc>> {
        let seconds = self.read_u32()?;
        return Utc.timestamp_opt(seconds as i64, 0).single().ok_or_else(|| {
            Error::DataError(format!("Invalid timestamp {}", seconds))
        });
    }

    fn read_addresses(&mut self) -> Result<Vec<Address>> {
        let count = self.read_u32()?;
        let mut addresses = Vec::new();
        for _ in 0..count {
            addresses.push(Address {
                addrtype: self.read_u16()?,
                addrdata: self.read_data()?,
            });
        }
        return Ok(addresses);
    }

    fn read_auth_data(&mut self) -> Result<Vec<AuthData>> {
        let count = self.read_u32()?;
        let mut auth_data = Vec::new();
        for _ in 0..count {
            auth_data.push(AuthData {
                ad_type: self.read_u16()?,
                ad_data: self.read_data()?,
            });
        }
        return Ok(auth_data);
    }

    fn read_string(&mut self) -> Result<String> {
        let data = self.read_data()?;
        return String::from_utf8(data).map_err(|_| {
            Error::DataError("Invalid UTF-8 string in principal".into())
        });
    }

    fn read_data(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as usize;
        return Ok(self.take(len)?.to_vec());
    }

    fn read_u8(&mut self) -> Result<u8> {
        return Ok(self.take(1)?[0]);
    }

    fn read_u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        let bytes = [raw[0], raw[1]];
        match self.byte_order {
            ByteOrder::Big => return Ok(u16::from_be_bytes(bytes)),
            ByteOrder::Native => return Ok(u16::from_ne_bytes(bytes)),
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        let bytes = [raw[0], raw[1], raw[2], raw[3]];
        match self.byte_order {
            ByteOrder::Big => return Ok(u32::from_be_bytes(bytes)),
            ByteOrder::Native => return Ok(u32::from_ne_bytes(bytes)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.available() {
            return Err(Error::DataError(format!(
                "Unexpected end of ccache data at offset {}",
                self.position
            )));
        }
        let raw = &self.raw[self.position..self.position + len];
        self.position += len;
        return Ok(raw);
    }
}

fn config_entry_from_server(
    server: &Principal,
    data: Vec<u8>,
) -> Option<ConfigEntry> {
    match server.components.len() {
        2 => {
            return Some(ConfigEntry::new(
                server.components[1].clone(),
                None,
                data,
            ))
        }
        3 => {
            let principal = server.components[2].parse().ok()?;
            return Some(ConfigEntry::new(
                server.components[1].clone(),
                Some(principal),
                data,
            ));
        }
        _ => return None,
    }
}

/// Builds the raw content of a cache file.
pub struct CCacheWriter {
    raw: Vec<u8>,
    version: u16,
    byte_order: ByteOrder,
}

impl CCacheWriter {
    pub fn new(version: u16) -> Self {
        return Self {
            raw: Vec::new(),
            version,
            byte_order: ByteOrder::for_version(version),
        };
    }

    pub fn write_header(
        &mut self,
        principal: &Principal,
        tag: Option<&Tag>,
    ) -> Result<()> {
        if !is_known_version(self.version) {
            return Err(Error::DataError(format!(
                "Unknown ccache version {:#06x}",
                self.version
            )));
        }
        self.raw.extend_from_slice(&self.version.to_be_bytes());

        if self.version == KRB5_FCC_FVNO_4 {
            let empty_tag = Tag::default();
            let tag = tag.unwrap_or(&empty_tag);
            let header_len: usize =
                tag.fields.iter().map(|f| 4 + f.data.len()).sum();
            self.write_u16(to_u16(header_len, "header tags length")?);
            for field in tag.fields.iter() {
                self.write_u16(field.tag);
                self.write_u16(to_u16(field.data.len(), "header tag length")?);
                self.raw.extend_from_slice(&field.data);
            }
        }

        return self.write_principal(principal);
    }

    pub fn write_credential(&mut self, cred: &Credential) -> Result<()> {
        self.write_principal(&cred.client)?;
        self.write_principal(&cred.server)?;
        self.write_key(&cred.key)?;
        self.write_time(&cred.times.authtime)?;
        self.write_time(&cred.times.starttime)?;
        self.write_time(&cred.times.endtime)?;
        self.write_time(&cred.times.renew_till)?;
        self.raw.push(cred.is_skey as u8);
        self.write_u32(cred.flags.flags);

        self.write_u32(to_u32(cred.addresses.len(), "addresses count")?);
        for address in cred.addresses.iter() {
            self.write_u16(address.addrtype);
            self.write_data(&address.addrdata)?;
        }

        self.write_u32(to_u32(cred.auth_data.len(), "auth data count")?);
        for ad in cred.auth_data.iter() {
            self.write_u16(ad.ad_type);
            self.write_data(&ad.ad_data)?;
        }

        self.write_data(&cred.ticket)?;
        return self.write_data(&cred.second_ticket);
    }

    /// Config entries are written as a credential of the primary principal
    /// for the reserved config service. The entry principal, if any, must
    /// have a realm to be parsed back.
    pub fn write_config_entry(
        &mut self,
        primary: &Principal,
        entry: &ConfigEntry,
    ) -> Result<()> {
        let mut components = vec![CONF_NAME.to_string(), entry.name.clone()];
        if let Some(principal) = &entry.principal {
            if principal.realm.is_empty() {
                return Err(Error::DataError(format!(
                    "Config entry {} principal {} has no realm",
                    entry.name, principal
                )));
            }
            components.push(principal.to_string());
        }
        let server = Principal::new(
            principal_names::NT_UNKNOWN,
            components,
            CONF_REALM.to_string(),
        );

        let epoch = epoch();
        let cred = Credential {
            client: primary.clone(),
            server,
            key: KeyBlock::default(),
            times: Times {
                authtime: epoch,
                starttime: epoch,
                endtime: epoch,
                renew_till: epoch,
            },
            is_skey: false,
            flags: TicketFlags::default(),
            addresses: Vec::new(),
            auth_data: Vec::new(),
            ticket: entry.data.clone(),
            second_ticket: Vec::new(),
        };
        return self.write_credential(&cred);
    }

    pub fn build(self) -> Vec<u8> {
        return self.raw;
    }

    fn write_principal(&mut self, principal: &Principal) -> Result<()> {
        let num_components =
            to_u32(principal.components.len(), "principal components")?;
        if self.version == KRB5_FCC_FVNO_1 {
            let num_components =
                num_components.checked_add(1).ok_or_else(|| {
                    Error::DataError("Too many principal components".into())
                })?;
            self.write_u32(num_components);
        } else {
            self.write_u32(principal.name_type as u32);
            self.write_u32(num_components);
        }
        self.write_data(principal.realm.as_bytes())?;
        for component in principal.components.iter() {
            self.write_data(component.as_bytes())?;
        }
        return Ok(());
    }

    fn write_key(&mut self, key: &KeyBlock) -> Result<()> {
        self.write_u16(key.keytype);
        if self.version == KRB5_FCC_FVNO_3 {
            self.write_u16(key.keytype);
        }
        return self.write_data(&key.keyvalue);
    }

    /// Times are stored as unsigned 32 bits seconds since the epoch.
    fn write_time(&mut self, time: &DateTime<Utc>) -> Result<()> {
        let seconds = u32::try_from(time.timestamp()).map_err(|_| {
            Error::DataError(format!("Timestamp {} out of range", time))
        })?;
        self.write_u32(seconds);
        return Ok(());
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write_u32(to_u32(data.len(), "data length")?);
        self.raw.extend_from_slice(data);
        return Ok(());
    }

    fn write_u16(&mut self, value: u16) {
        match self.byte_order {
            ByteOrder::Big => self.raw.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::Native => {
                self.raw.extend_from_slice(&value.to_ne_bytes())
            }
        }
    }

    fn write_u32(&mut self, value: u32) {
        match self.byte_order {
            ByteOrder::Big => self.raw.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::Native => {
                self.raw.extend_from_slice(&value.to_ne_bytes())
            }
        }
    }
}

fn to_u16(value: usize, what: &str) -> Result<u16> {
    return u16::try_from(value).map_err(|_| {
        Error::DataError(format!("Too big {}: {}", what, value))
    });
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    return u32::try_from(value).map_err(|_| {
        Error::DataError(format!("Too big {}: {}", what, value))
    });
}

fn epoch() -> DateTime<Utc> {
    return DateTime::<Utc>::from(UNIX_EPOCH);
}
