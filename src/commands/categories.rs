use crate::api::{self, Mode};
use crate::commands::Out;
use crate::fetcher::{DatasetKind, Fetcher};
use crate::{Config, Result};

/// Prints the category to parent-category mapping from the categories dataset.
pub async fn categories(config: Config, mode: Mode) -> Result<Out<Vec<(String, String)>>> {
    let provider = api::provider(&config, mode);
    let mut fetcher = Fetcher::new(&config, provider).await?;
    let data = fetcher
        .request(DatasetKind::Categories)
        .await?
        .into_categories()?;

    let mut pairs: Vec<(String, String)> = data.parent_map().into_iter().collect();
    pairs.sort();
    let mut message = format!("{} categories:\n", pairs.len());
    for (category, parent) in &pairs {
        message.push_str(&format!("{category} -> {parent}\n"));
    }
    Ok(Out::new(message.trim_end().to_string(), pairs))
}
