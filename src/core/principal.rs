use crate::error::Error;
use crate::Result;
use kerberos_constants::principal_names;
use std::fmt;
use std::str::FromStr;

pub const TGS_NAME: &str = "krbtgt";

/// A Kerberos principal: name components plus realm. The name type is kept
/// to be written back to the cache but it is ignored when comparing.
#[derive(Debug, Clone)]
pub struct Principal {
    pub name_type: i32,
    pub components: Vec<String>,
    pub realm: String,
}

impl Principal {
    pub fn new(name_type: i32, components: Vec<String>, realm: String) -> Self {
        return Self {
            name_type,
            components,
            realm,
        };
    }

    pub fn name_strings(&self) -> &[String] {
        return &self.components;
    }

    pub fn realm(&self) -> &str {
        return &self.realm;
    }

    /// Relaxed comparison used to look for service tickets. Components and
    /// realm are compared case insensitive, and an empty realm matches any
    /// realm.
    pub fn matches(&self, other: &Principal) -> bool {
        if !self.realm.is_empty()
            && !other.realm.is_empty()
            && !eq_ignore_case(&self.realm, &other.realm)
        {
            return false;
        }
        return name_strings_match(&self.components, &other.components);
    }

    /// Whether this is a TGT service name for its own realm, in the
    /// form krbtgt/REALM@REALM. Referral TGTs (krbtgt/OTHER@REALM) are not.
    pub fn is_local_tgs(&self) -> bool {
        if !self.to_string().starts_with(TGS_NAME) {
            return false;
        }

        match self.components.get(1) {
            Some(tgs_realm) => return tgs_realm == &self.realm,
            None => return false,
        }
    }
}

/// Components equality, element by element, case insensitive.
pub fn name_strings_match(s1: &[String], s2: &[String]) -> bool {
    if s1.len() != s2.len() {
        return false;
    }
    return s1
        .iter()
        .zip(s2.iter())
        .all(|(c1, c2)| eq_ignore_case(c1, c2));
}

/// Char by char comparison that folds case for any script, not only ASCII.
pub fn eq_ignore_case(s1: &str, s2: &str) -> bool {
    let mut chars1 = s1.chars();
    let mut chars2 = s2.chars();
    loop {
        match (chars1.next(), chars2.next()) {
            (None, None) => return true,
            (Some(c1), Some(c2)) => {
                if c1 != c2
                    && !c1.to_uppercase().eq(c2.to_uppercase())
                    && !c1.to_lowercase().eq(c2.to_lowercase())
                {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Exact equality of components and realm.
impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        return self.components == other.components && self.realm == other.realm;
    }
}

impl Eq for Principal {}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let components: Vec<String> =
            self.components.iter().map(|c| escape(c)).collect();
        write!(f, "{}", components.join("/"))?;
        if !self.realm.is_empty() {
            write!(f, "@{}", escape(&self.realm))?;
        }
        return Ok(());
    }
}

fn escape(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == '/' || c == '@' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    return escaped;
}

/// Parses `comp1/comp2@REALM`. The realm is mandatory.
impl FromStr for Principal {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let mut components = Vec::new();
        let mut current = String::new();
        let mut realm = None;
        let mut chars = name.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| {
                        Error::DataError(format!(
                            "Invalid principal name '{}': trailing escape",
                            name
                        ))
                    })?;
                    current.push(escaped);
                }
                '/' if realm.is_none() => {
                    components.push(current);
                    current = String::new();
                }
                '@' if realm.is_none() => {
                    components.push(current);
                    current = String::new();
                    realm = Some(String::new());
                }
                '@' => {
                    return Err(Error::DataError(format!(
                        "Invalid principal name '{}': unexpected '@'",
                        name
                    )));
                }
                c => current.push(c),
            }
        }

        if realm.is_none() {
            return Err(Error::DataError(format!(
                "Invalid principal name '{}': no realm",
                name
            )));
        }

        if current.is_empty() || components.iter().any(|c| c.is_empty()) {
            return Err(Error::DataError(format!(
                "Invalid principal name '{}': empty component",
                name
            )));
        }

        let name_type = if components.len() > 1 {
            principal_names::NT_SRV_INST
        } else {
            principal_names::NT_PRINCIPAL
        };

        return Ok(Self::new(name_type, components, current));
    }
}

pub fn new_nt_principal(name: &str, realm: &str) -> Principal {
    return new_principal(name, realm, principal_names::NT_PRINCIPAL);
}

pub fn new_nt_srv_inst(service: &str, realm: &str) -> Principal {
    return new_principal(service, realm, principal_names::NT_SRV_INST);
}

fn new_principal(name: &str, realm: &str, name_type: i32) -> Principal {
    return Principal::new(
        name_type,
        spn_to_service_parts(name),
        realm.to_string(),
    );
}

pub fn spn_to_service_parts(spn: &str) -> Vec<String> {
    spn.split("/").map(|s| s.to_string()).collect()
}
