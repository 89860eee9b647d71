use anyhow::Result;
use harvest_rollup::config::Config;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let config = Config::from_env()?.apply_args(std::env::args().skip(1))?;
    harvest_rollup::run(&config, std::io::stdout())
}
