mod article;
mod calendar;
mod error;
mod serve;
mod session;
mod store;

use std::net::SocketAddr;

use clap::Parser;
use comfy_table::{Row, Table};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use miette::{miette, IntoDiagnostic};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
pub enum Command {
    /// Serve the diary on the configured address
    Serve,
    /// List stored entries, optionally limited to one year or month
    List {
        #[arg(short, long)]
        year: Option<i32>,
        #[arg(short, long)]
        month: Option<u32>,
    },
}

#[derive(Deserialize)]
pub struct Config {
    server: Option<ServerConfig>,
}

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
    pub title: String,
    pub description: String,
    pub password: String,
    pub db_path: String,
    pub addr: SocketAddr,
    pub favicon: Option<String>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daybook=info")),
        )
        .init();

    let command = Command::parse();

    let config: Config = Figment::new()
        .merge(Toml::file("diary.toml"))
        .extract()
        .into_diagnostic()?;
    let server = config.server.ok_or(miette!("no server config found"))?;

    match command {
        Command::Serve => serve::serve(server).await?,
        Command::List { year, month } => list_entries(&server, year, month).await?,
    }

    Ok(())
}

async fn list_entries(
    config: &ServerConfig,
    year: Option<i32>,
    month: Option<u32>,
) -> miette::Result<()> {
    let pool = serve::open_pool(&config.db_path).await?;
    store::init_schema(&pool).await.into_diagnostic()?;

    let articles = match (year, month) {
        (Some(year), Some(month)) => store::month_articles(&pool, year, month)
            .await
            .into_diagnostic()?,
        (Some(year), None) => store::year_articles(&pool, year).await.into_diagnostic()?,
        (None, None) => store::all_articles(&pool).await.into_diagnostic()?,
        (None, Some(_)) => return Err(miette!("--month requires --year")),
    };

    let mut table = Table::new();
    table.set_header(Row::from(vec!["Date", "Entry"]));
    for article in articles {
        table.add_row(Row::from(vec![
            format!("{:04}-{:02}-{:02}", article.year, article.month, article.day),
            article.excerpt(),
        ]));
    }
    println!("{table}");

    Ok(())
}
