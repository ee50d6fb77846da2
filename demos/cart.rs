use anyhow::Context;
use cart_state::{CartConfig, CartService, Caller, utils};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = CartConfig::from_env()?;
    let service = CartService::open(&config).context("failed to open cart database")?;

    let cart = utils::new_cart_id()?;
    let shopper = Caller::identity("shopper");
    let developer = Caller::identity(config.privileged_identity.clone());

    service.initialize(&cart)?;

    for (item_id, qty, price) in [("X", 2, 10), ("X", 3, 5), ("Y", 1, 7)] {
        let body = json!({ "itemId": item_id, "qty": qty, "price": price });
        let response = service.handle(&cart, &shopper, "update", Some(&body));
        println!("update {item_id}: {} {:?}", response.status.code(), response.body);
    }

    let response = service.handle(&cart, &shopper, "getState", None);
    println!("{:#?}", response);

    // a stale version is refused
    let body = json!({ "state": { "items": [], "totalSum": 0 }, "version": 0 });
    let response = service.handle(&cart, &developer, "setState", Some(&body));
    println!("setState with version 0: {} {:?}", response.status.code(), response.body);

    let current = service.get_state(&cart)?.version;
    let body = json!({ "state": { "items": [], "totalSum": 0 }, "version": current });
    let response = service.handle(&cart, &developer, "setState", Some(&body));
    println!("setState with version {current}: {}", response.status.code());

    let response = service.handle(&cart, &shopper, "setState", Some(&body));
    println!("setState by shopper: {}", response.status.code());

    service.flush()?;

    Ok(())
}
