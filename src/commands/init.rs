use krbcc::core::{Config, FileCCache, Principal};
use krbcc::Result;
use log::info;

pub fn init(
    principal: Principal,
    out_file: Option<String>,
    config: &Config,
) -> Result<()> {
    let ccache = FileCCache::create(principal, out_file.as_deref(), config)?;
    info!(
        "Created cache {} for {}",
        ccache.cache_name().display(),
        ccache
            .primary_principal()
            .map(|p| p.to_string())
            .unwrap_or_default()
    );
    return Ok(());
}
