use crate::api::{self, Mode};
use crate::args::TransactionsArgs;
use crate::commands::Out;
use crate::fetcher::{DatasetKind, Fetcher};
use crate::{utils, Config, Result};

/// Writes the processed transactions table as CSV to the path in `args`.
pub async fn transactions(
    config: Config,
    mode: Mode,
    args: TransactionsArgs,
) -> Result<Out<()>> {
    let provider = api::provider(&config, mode);
    let mut fetcher = Fetcher::new(&config, provider).await?;
    let data = fetcher
        .request(DatasetKind::Transactions)
        .await?
        .into_transactions()?;

    let csv = data.to_csv()?;
    utils::write(args.output(), csv).await?;
    Ok(format!(
        "Wrote {} transactions to '{}'",
        data.rows().len(),
        args.output().display()
    )
    .into())
}
