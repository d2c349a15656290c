//! sales-query binary entry point

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sales_query::{
    config::AppConfig,
    http_server,
    llm::LlmClient,
    logging::{init_logging, LogConfig},
    pipeline::QueryPipeline,
    sales::{Money, NewSale, SaleFilter, SaleStore},
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sales-query", version, about = "Ask questions about your sales in plain language")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "SALES_QUERY_CONFIG")]
    config: Option<String>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve {
        /// Bind address, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one question through the pipeline and print the result as JSON
    Ask { question: String },
    /// Create the sales table if missing
    Migrate,
    /// Manage sale records
    #[command(subcommand)]
    Sales(SalesCommand),
    /// Write sales-query.toml.example
    InitConfig,
}

#[derive(Subcommand)]
enum SalesCommand {
    /// Record a sale
    Add {
        #[arg(long)]
        product: String,
        #[arg(long)]
        sold: Money,
        #[arg(long)]
        purchased: Money,
        /// Defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List sales, newest first, with profit
    List(ListArgs),
    /// Change the prices of a sale
    SetPrice {
        id: i64,
        #[arg(long)]
        sold: Option<Money>,
        #[arg(long)]
        purchased: Option<Money>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Substring of the product name
    #[arg(long)]
    search: Option<String>,
    /// Exact product name
    #[arg(long)]
    product: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long, requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

impl From<ListArgs> for SaleFilter {
    fn from(args: ListArgs) -> Self {
        SaleFilter {
            search: args.search,
            product: args.product,
            date: args.date,
            from: args.from,
            to: args.to,
            year: args.year,
            month: args.month,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        AppConfig::write_sample("sales-query.toml.example")?;
        println!("Wrote sales-query.toml.example");
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut log_config = LogConfig::from_config(&config.logging);
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Serve { bind } => {
            let pipeline = build_pipeline(&config)?;
            let addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            http_server::serve(&addr, Arc::new(pipeline)).await?;
        }
        Command::Ask { question } => {
            let pipeline = build_pipeline(&config)?;
            let answer = pipeline.run(&question).await;
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Command::Migrate => {
            let store = SaleStore::open(&config.database.path).await?;
            store.migrate().await?;
            store.close().await;
        }
        Command::Sales(command) => {
            let store = SaleStore::open(&config.database.path).await?;
            store.migrate().await?;
            run_sales_command(&store, command).await?;
            store.close().await;
        }
        Command::InitConfig => unreachable!("handled before configuration is loaded"),
    }

    Ok(())
}

fn build_pipeline(config: &AppConfig) -> Result<QueryPipeline> {
    let client = LlmClient::new(config.llm.clone()).context("Failed to create LLM client")?;
    info!(
        provider = client.provider_name(),
        model = %config.llm.default_model,
        database = %config.database.path.display(),
        "Pipeline ready"
    );
    Ok(QueryPipeline::new(config.pipeline(), client))
}

async fn run_sales_command(store: &SaleStore, command: SalesCommand) -> Result<()> {
    match command {
        SalesCommand::Add {
            product,
            sold,
            purchased,
            date,
        } => {
            let mut sale = NewSale::new(product, sold, purchased);
            if let Some(date) = date {
                sale = sale.on(date);
            }
            let sale = store.insert(&sale).await?;
            println!("Added #{}: {} (profit {})", sale.id, sale, sale.profit());
        }
        SalesCommand::List(args) => {
            let sales = store.list(&args.into()).await?;
            println!(
                "{:>5}  {:<30} {:<10} {:>12} {:>12} {:>12}",
                "ID", "Product name", "Date", "Purchased", "Sold", "Profit"
            );
            for sale in &sales {
                println!(
                    "{:>5}  {:<30} {:<10} {:>12} {:>12} {:>12}",
                    sale.id,
                    sale.product_name,
                    sale.date,
                    sale.price_purchased.to_string(),
                    sale.price_sold.to_string(),
                    sale.profit().to_string()
                );
            }
            println!("{} sale(s)", sales.len());
        }
        SalesCommand::SetPrice {
            id,
            sold,
            purchased,
        } => {
            let sale = store.update_prices(id, sold, purchased).await?;
            println!("Updated #{}: profit now {}", sale.id, sale.profit());
        }
    }
    Ok(())
}
