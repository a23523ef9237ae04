use bnbchain::core::config::ChainEnv;
use bnbchain::dex::DexClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Testnet is safe to poke at without funds
    let client = DexClient::new(ChainEnv::testnet())?;

    match client.node_info().await {
        Ok(info) => {
            println!(
                "Connected to {} (chain {})",
                info.node_info.moniker, info.node_info.network
            );
        }
        Err(e) => {
            println!("Error fetching node info: {}", e);
        }
    }

    println!("Fetching markets...");
    match client.markets().await {
        Ok(markets) => {
            println!("Found {} listed pairs", markets.len());
            // Print first 5 pairs as example
            for market in markets.iter().take(5) {
                println!(
                    "Pair: {}_{} (tick {}, lot {})",
                    market.base_asset_symbol,
                    market.quote_asset_symbol,
                    market.tick_size,
                    market.lot_size
                );
            }
        }
        Err(e) => {
            println!("Error fetching markets: {}", e);
        }
    }

    // Example order broadcast (commented out - needs a funded wallet)
    /*
    use bnbchain::chain::{NewOrderMsg, Wallet};

    let mut wallet = Wallet::from_private_key("your_private_key_hex", ChainEnv::testnet())?;
    let order = NewOrderMsg::limit_buy("BNB_BTC.B-918", 0.0096, 10i64);

    match client.broadcast_msg(&mut wallet, &order, true).await {
        Ok(receipt) => {
            println!("Order accepted: {:?}", receipt);
        }
        Err(e) => {
            println!("Error placing order: {}", e);
        }
    }
    */

    Ok(())
}
