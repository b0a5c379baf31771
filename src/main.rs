use anyhow::Result;
use tweet_classifier::{logging, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load()?;

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run().await?;

    if stats.interrupted {
        std::process::exit(130);
    }

    Ok(())
}
