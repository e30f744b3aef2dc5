use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use eyre::Context;
use log::info;
use model::{config::CommissionConfig, period::Period};
use mongodb::bson::oid::ObjectId;
use payroll::service::notify::{LogMailer, LogNotifier, NotificationDispatcher};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // The logger is not up yet; .env may carry RUST_LOG.
    if let Err(err) = dotenv() {
        eprintln!("Failed to load .env file: {}", err);
    }
    pretty_env_logger::init();
    color_eyre::install()?;

    info!("connecting to mongo");
    let mongo_url = env::var("MONGO_URL").context("Failed to get MONGO_URL from env")?;
    let storage = storage::Storage::new(&mongo_url)
        .await
        .context("Failed to create storage")?;

    let config = CommissionConfig::from_env().context("Failed to load commission config")?;
    let dispatcher = NotificationDispatcher::new(Arc::new(LogNotifier), Arc::new(LogMailer));
    let payroll = payroll::Payroll::new(storage, config, dispatcher);

    let mut args = env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (Some("generate"), Some(token)) => {
            let period: Period = token.parse()?;
            let created = payroll.salaries.generate_monthly(period).await?;
            if created {
                info!("salaries generated for {}", period);
            } else {
                info!("nothing to generate for {}", period);
            }
        }
        (Some("pay"), Some(id)) => {
            let id = ObjectId::parse_str(&id).context("Invalid salary record id")?;
            payroll.salaries.pay(id).await?;
            info!("salary {} marked as paid", id);
        }
        (Some("expense"), Some(token)) => {
            let period: Period = token.parse()?;
            let total = payroll.salaries.total_expense(period).await?;
            info!("total payroll expense for {}: {}", period, total);
        }
        _ => eyre::bail!("Usage: payroll-cli generate <YYYY-MM> | pay <id> | expense <YYYY-MM>"),
    }

    Ok(())
}
