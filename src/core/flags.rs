use kerberos_constants::ticket_flags;
use std::fmt;

/// Ticket flags as stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TicketFlags {
    pub flags: u32,
}

impl TicketFlags {
    pub fn new(flags: u32) -> Self {
        return Self { flags };
    }

    pub fn has(&self, flag: u32) -> bool {
        return (self.flags & flag) != 0;
    }

    /// The forwardable, proxiable and renewable bits must be the ones
    /// requested by the options. Other bits are not taken into account.
    pub fn matches(&self, options: &LoginOptions) -> bool {
        return self.has(ticket_flags::FORWARDABLE) == options.forwardable
            && self.has(ticket_flags::PROXIABLE) == options.proxiable
            && self.has(ticket_flags::RENEWABLE) == options.renewable;
    }
}

impl fmt::Display for TicketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (ticket_flags::FORWARDABLE, "forwardable"),
            (ticket_flags::FORWARDED, "forwarded"),
            (ticket_flags::PROXIABLE, "proxiable"),
            (ticket_flags::PROXY, "proxy"),
            (ticket_flags::MAY_POSTDATE, "may_postdate"),
            (ticket_flags::POSTDATE, "postdate"),
            (ticket_flags::RENEWABLE, "renewable"),
            (ticket_flags::INITIAL, "initial"),
            (ticket_flags::INVALID, "invalid"),
            (ticket_flags::HW_AUTHENT, "hw_authent"),
            (ticket_flags::PRE_AUTHENT, "pre_authent"),
            (
                ticket_flags::TRANSITED_POLICY_CHECKED,
                "transited_policy_checked",
            ),
            (ticket_flags::OK_AS_DELEGATE, "ok_as_delegate"),
            (ticket_flags::REQUEST_ANONYMOUS, "anonymous"),
            (ticket_flags::NAME_CANONICALIZE, "name_canonicalize"),
        ];

        let flags_strs: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect();

        write!(f, "{:#x} -> {}", self.flags, flags_strs.join(" "))
    }
}

/// Ticket properties requested by the caller when looking for credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoginOptions {
    pub forwardable: bool,
    pub proxiable: bool,
    pub renewable: bool,
}

impl LoginOptions {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn forwardable(mut self, value: bool) -> Self {
        self.forwardable = value;
        return self;
    }

    pub fn proxiable(mut self, value: bool) -> Self {
        self.proxiable = value;
        return self;
    }

    pub fn renewable(mut self, value: bool) -> Self {
        self.renewable = value;
        return self;
    }
}
