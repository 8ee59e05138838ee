use catalog_axum::{build, start_server};
use catalog_core::ports::{CategoryRepository as _, ProductRepository as _};
use catalog_file::Catalog;
use catalogd::{AppConfig, Cli, impls::CatalogApp};
use std::{fs::File, sync::Arc};
use tracing::{Level, event};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // By convention, we leverage `tracing` to instrument and log various
    // operations throughout this project.
    // Accordingly, we likely want to subscribe to these events so we can
    // write them to stdio and possibly some durable location.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI args, picking up the dotenv file on the way
    let cli = Cli::import()?;

    // Create config with proper layering of CLI args
    let AppConfig { server, files } = AppConfig::load(&cli)?;

    // Nothing is read yet; the caches populate on first use
    let catalog = Arc::new(Catalog::open(&files)?);
    let app = CatalogApp {
        catalog: catalog.clone(),
    };

    // If requested, dump the schema and exit.
    if let Some(path) = cli.schema {
        let schema = build(app, server).1;
        serde_json::to_writer_pretty(File::create(path)?, &*schema)?;
        return Ok(());
    }

    // If requested, load everything once and report.
    if cli.check {
        return tokio::task::spawn_blocking(move || check(&catalog)).await?;
    }

    start_server(server, app).await?;
    Ok(())
}

fn check(catalog: &Catalog) -> anyhow::Result<()> {
    let products = catalog.product_report()?;
    event!(
        Level::INFO,
        path = catalog.product_location(),
        source = ?products.source,
        accepted = products.accepted,
        rejected = products.rejected,
        "products"
    );

    let categories = catalog.categories.snapshot()?.report;
    event!(
        Level::INFO,
        path = %catalog.categories.path().display(),
        source = ?categories.source,
        accepted = categories.accepted,
        rejected = categories.rejected,
        top_level = catalog.top_level_categories()?.len(),
        leaves = catalog.leaf_categories(0, usize::MAX)?.len(),
        "categories"
    );
    Ok(())
}
