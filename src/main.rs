use anyhow::Context;
use fwfetch::config::{config_path, Config};
use fwfetch::{logging, Api};

#[tokio::main]
async fn main() {
    logging::init_logging();

    if let Err(err) = run().await {
        eprintln!("fwfetch error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let path = config_path();
    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
    Api::from_config(&config).sync().await?;
    Ok(())
}
