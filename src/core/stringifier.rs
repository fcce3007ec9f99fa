use crate::core::{ConfigEntry, Credential};
use chrono::{DateTime, Local, Utc};
use kerberos_constants::etypes;
use kerberos_constants::principal_names;

const UNKNOWN: &str = "???";

pub fn credential_to_string(cred: &Credential, indent_level: usize) -> String {
    let indentation = indent(indent_level);
    format!(
        "{}{} => {}\n\
         {}Valid starting: {}\n\
         {}Expires: {}\n\
         {}Renew until: {}\n\
         {}Flags: {}\n\
         {}Etype (skey): {}",
        indentation,
        cred.client,
        cred.server,
        indentation,
        kerberos_time_to_string(&cred.times.starttime),
        indentation,
        kerberos_time_to_string(&cred.times.endtime),
        indentation,
        kerberos_time_to_string(&cred.times.renew_till),
        indentation,
        cred.flags,
        indentation,
        etype_to_string(cred.key.keytype as i32),
    )
}

pub fn config_entry_to_string(entry: &ConfigEntry, indent_level: usize) -> String {
    let indentation = indent(indent_level);
    let principal = entry
        .principal
        .as_ref()
        .map(|p| format!(" ({})", p))
        .unwrap_or_default();
    format!(
        "{}{}{}: {}",
        indentation,
        entry.name,
        principal,
        octet_string_to_string(&entry.data)
    )
}

pub fn kerberos_time_to_string(krb_time: &DateTime<Utc>) -> String {
    krb_time
        .with_timezone(&Local)
        .format("%m/%d/%Y %H:%M:%S")
        .to_string()
}

/// Printable data is shown as text, the rest as hex.
pub fn octet_string_to_string(data: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(data) {
        if !text.is_empty() && text.chars().all(|c| !c.is_control()) {
            return text.to_string();
        }
    }
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn etype_to_string(etype: i32) -> String {
    format!("{} -> {}", etype, etype_to_str(etype))
}

pub fn etype_to_str(etype: i32) -> &'static str {
    match etype {
        etypes::AES256_CTS_HMAC_SHA1_96 => "aes256-cts-hmac-sha1-96",
        etypes::AES128_CTS_HMAC_SHA1_96 => "aes128-cts-hmac-sha1-96",
        etypes::RC4_HMAC => "rc4-hmac",
        etypes::DES_CBC_MD5 => "des-cbc-md5",
        etypes::DES_CBC_CRC => "des-cbc-crc",
        etypes::NO_ENCRYPTION => "no-encryption",
        _ => UNKNOWN,
    }
}

pub fn principal_name_type_to_string(name_type: i32) -> String {
    format!("{} -> {}", name_type, principal_name_type_to_str(name_type))
}

pub fn principal_name_type_to_str(name_type: i32) -> &'static str {
    match name_type {
        principal_names::NT_UNKNOWN => "nt-unknown",
        principal_names::NT_PRINCIPAL => "nt-principal",
        principal_names::NT_SRV_INST => "nt-srv-inst",
        principal_names::NT_SRV_HST => "nt-srv-hst",
        principal_names::NT_SRV_XHST => "nt-srv-xhst",
        principal_names::NT_UID => "nt-uid",
        principal_names::NT_X500_PRINCIPAL => "nt-x500-principal",
        principal_names::NT_SMTP_NAME => "nt-smtp-name",
        principal_names::NT_ENTERPRISE => "nt-enterprise",
        _ => UNKNOWN,
    }
}

fn indent(level: usize) -> String {
    " ".repeat(level)
}
