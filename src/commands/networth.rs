use crate::api::{self, Mode};
use crate::commands::Out;
use crate::fetcher::{DatasetKind, Fetcher};
use crate::model::Amount;
use crate::{Config, Result};
use format_num::NumberFormat;
use serde::{Deserialize, Serialize};

/// One labeled line of the net-worth summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub amount: Amount,
}

/// Computes and prints the net-worth summary from the accounts dataset.
pub async fn networth(config: Config, mode: Mode) -> Result<Out<Vec<SummaryLine>>> {
    let provider = api::provider(&config, mode);
    let mut fetcher = Fetcher::new(&config, provider).await?;
    let accounts = fetcher
        .request(DatasetKind::Accounts)
        .await?
        .into_accounts()?;

    let num = NumberFormat::new();
    let mut message = String::from("Net worth summary:\n");
    let mut lines = Vec::new();
    for (label, amount) in accounts.summary() {
        message.push_str(&format!(
            "{:.<22}{:>16}\n",
            label,
            num.format(",.2f", amount.to_f64())
        ));
        lines.push(SummaryLine { label, amount });
    }
    Ok(Out::new(message.trim_end().to_string(), lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn networth_summarizes_seeded_accounts() {
        let env = TestEnv::new().await;
        let out = networth(env.config(), Mode::Test).await.unwrap();
        assert!(out.message().contains("Grand Total"));
        let lines = out.structure().unwrap();
        let grand_total = lines.iter().find(|l| l.label == "Grand Total").unwrap();
        // 2500.00 - 430.25 + 12000.00, the inactive account is excluded.
        assert_eq!(grand_total.amount.to_string(), "14069.75");
    }
}
