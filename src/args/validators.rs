use krbcc::core::{ImpersonationPolicy, Principal};

pub fn is_principal(v: String) -> Result<(), String> {
    v.parse::<Principal>().map_err(|err| err.to_string())?;
    return Ok(());
}

pub fn is_policy(v: String) -> Result<(), String> {
    v.parse::<ImpersonationPolicy>()
        .map_err(|err| err.to_string())?;
    return Ok(());
}
