use crate::commands::Out;
use crate::{Config, Result};

/// Deletes every cache entry so the next request starts from the provider.
pub async fn cache_clear(config: Config) -> Result<Out<()>> {
    let cache = config.cache_store().await?;
    let removed = cache.clear().await?;
    Ok(format!("Deleted {removed} cache entries").into())
}
