use krbcc::core::stringifier::{
    config_entry_to_string, credential_to_string,
    principal_name_type_to_string,
};
use krbcc::core::{Config, Credentials, FileCCache};
use krbcc::Result;

pub fn list(
    in_file: Option<String>,
    only_tgts: bool,
    srealm: Option<String>,
    show_config: bool,
    show_initial: bool,
    config: &Config,
) -> Result<()> {
    let ccache = FileCCache::acquire(None, in_file.as_deref(), config)
        .ok_or_else(|| match &in_file {
            Some(in_file) => format!("Unable to load cache '{}'", in_file),
            None => "Unable to load default cache".to_string(),
        })?;

    print_header(&ccache);

    let mut creds = ccache.creds_list().unwrap_or_default();
    if only_tgts {
        creds = creds.tgt();
    }
    if let Some(srealm) = srealm {
        creds = creds.srealm(&srealm);
    }
    print_ccache_creds(&creds);

    if show_config {
        print_config_entries(&ccache);
    }

    if show_initial {
        print_initial_creds(&ccache)?;
    }

    return Ok(());
}

fn print_header(ccache: &FileCCache) {
    println!("Ticket cache: FILE:{}", ccache.cache_name().display());
    println!("Version: {:#06x}", ccache.version());

    if let Some(principal) = ccache.primary_principal() {
        println!(
            "Default principal: {} ({})",
            principal,
            principal_name_type_to_string(principal.name_type)
        );
    }

    if let Some((seconds, microseconds)) =
        ccache.tag().and_then(|tag| tag.time_offset())
    {
        println!("KDC time offset: {}s {}us", seconds, microseconds);
    }
}

fn print_ccache_creds(creds: &Credentials) {
    for cred in creds.iter() {
        println!("");
        println!("{}", credential_to_string(cred, 0));
    }
}

fn print_config_entries(ccache: &FileCCache) {
    let entries = ccache.config_entries();
    if entries.is_empty() {
        return;
    }

    println!("");
    println!("Config entries:");
    for entry in entries.iter() {
        println!("{}", config_entry_to_string(entry, 2));
    }
}

fn print_initial_creds(ccache: &FileCCache) -> Result<()> {
    println!("");
    match ccache.get_initial_creds()? {
        Some(initial) => {
            println!("Initial credential:");
            println!("{}", credential_to_string(&initial.tgt, 2));
            if let Some(proxy) = &initial.proxy {
                println!("  Impersonating {}:", proxy.client);
                println!("{}", credential_to_string(proxy, 4));
            }
        }
        None => println!("No initial credential"),
    }
    return Ok(());
}
