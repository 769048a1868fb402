//! ARCA storefront terminal client
//!
//! Thin interactive front end over the client library: browse the
//! catalog, edit the cart, sign in, and check out. All state and
//! orchestration live in the library; this binary only renders and
//! parses commands.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arca_client::api::models::Product;
use arca_client::domain::events::CheckoutEvent;
use arca_client::{
    ApiClient, AuthSession, CartStore, CheckoutOrchestrator, CheckoutRequest, Config, FileStorage,
    KeyValueStorage, MemoryStorage, SubmissionPhase,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let storage: Arc<dyn KeyValueStorage> = match FileStorage::open(&config.data_dir) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::warn!(error = %e, "Data directory unavailable, falling back to in-memory storage");
            Arc::new(MemoryStorage::new())
        }
    };

    let api = Arc::new(ApiClient::new(config.api_url.clone()));
    let mut session = AuthSession::load(storage.clone());
    session.attach(&api);
    let mut cart = CartStore::load(storage);
    cart.subscribe(|event| tracing::debug!(?event, "Cart mutated"));
    let mut orchestrator = CheckoutOrchestrator::new(api.clone());
    let mut catalog: Vec<Product> = vec![];

    println!("ARCA storefront — {}", config.api_url);
    print_help();

    print!("> ");
    io::stdout().flush()?;
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            print!("> ");
            io::stdout().flush()?;
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "help" => print_help(),
            "products" => match api.list_products().await {
                Ok(products) => {
                    catalog = products;
                    for (i, p) in catalog.iter().enumerate() {
                        println!("{:>3}. {} — {} MT (stock {})", i + 1, p.name, p.price, p.stock);
                    }
                }
                Err(e) => println!("error: {e}"),
            },
            "add" => {
                let index: usize = args.first().and_then(|a| a.parse().ok()).unwrap_or(0);
                let quantity: u32 = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(1);
                match catalog.get(index.wrapping_sub(1)) {
                    Some(product) => {
                        cart.add_line(product.to_cart_line(quantity));
                        print_cart(&cart);
                    }
                    None => println!("unknown product number; run `products` first"),
                }
            }
            "rm" => {
                if let Some(id) = args.first() {
                    cart.remove_line(id);
                    print_cart(&cart);
                }
            }
            "dec" => {
                if let Some(id) = args.first() {
                    cart.decrement_line(id);
                    print_cart(&cart);
                }
            }
            "qty" => {
                let quantity: Option<u32> = args.get(1).and_then(|a| a.parse().ok());
                match (args.first(), quantity) {
                    (Some(id), Some(quantity)) => {
                        cart.set_quantity(id, quantity);
                        print_cart(&cart);
                    }
                    _ => println!("usage: qty <product-id> <quantity>"),
                }
            }
            "cart" => print_cart(&cart),
            "clear" => {
                cart.clear();
                print_cart(&cart);
            }
            "login" => match (args.first(), args.get(1)) {
                (Some(email), Some(password)) => match session.login(&api, email, password).await {
                    Ok(user) => println!("signed in as {} ({} points)", user.name, user.points_balance),
                    Err(e) => println!("login failed: {e}"),
                },
                _ => println!("usage: login <email> <password>"),
            },
            "logout" => {
                session.logout(&api);
                println!("signed out");
            }
            "me" => match api.me().await {
                Ok(user) => println!("{} <{}> — {:?}, {} points", user.name, user.email, user.role, user.points_balance),
                Err(e) => println!("error: {e}"),
            },
            "orders" => match api.my_orders().await {
                Ok(orders) => {
                    for order in orders {
                        println!("{} — {:?} — {} MT ({})", order.id, order.status, order.total_amount, order.created_at);
                    }
                }
                Err(e) => println!("error: {e}"),
            },
            "checkout" => {
                let points_to_use: i64 = args.first().and_then(|a| a.parse().ok()).unwrap_or(0);
                let request = CheckoutRequest { points_to_use, ..Default::default() };
                let _ = orchestrator.submit(&mut cart, session.token(), request).await;
                for event in orchestrator.take_events() {
                    if let CheckoutEvent::Completed { order_id } = event {
                        println!("order {order_id} placed — see `orders` for history");
                    }
                }
                let state = orchestrator.state();
                if state.phase == SubmissionPhase::Failed {
                    if let Some(message) = &state.error_message {
                        println!("{message}");
                    }
                    for shortfall in &state.shortfalls {
                        if shortfall.is_unknown() {
                            println!("  out of stock (no product detail from the server)");
                        } else {
                            println!(
                                "  {}: available {}, in cart {}",
                                shortfall.name.as_deref().unwrap_or(&shortfall.product_id),
                                shortfall.available,
                                shortfall.requested
                            );
                        }
                    }
                }
            }
            "commissions" => match api.my_commissions(&Default::default()).await {
                Ok(records) => {
                    for r in records {
                        println!("{} — {:?} — {} MT (paid: {})", r.order_id, r.kind, r.amount, r.paid);
                    }
                }
                Err(e) => println!("error: {e}"),
            },
            "payouts" => match api.my_payouts(None, None).await {
                Ok(payouts) => {
                    for p in payouts {
                        println!("{} — {:?} — {} MT", p.id, p.status, p.amount);
                    }
                }
                Err(e) => println!("error: {e}"),
            },
            "quit" | "exit" => break,
            other => println!("unknown command: {other} (try `help`)"),
        }

        print!("> ");
        io::stdout().flush()?;
    }

    Ok(())
}

fn print_cart(cart: &CartStore) {
    let snapshot = cart.snapshot();
    if snapshot.lines.is_empty() {
        println!("cart is empty");
        return;
    }
    for line in &snapshot.lines {
        println!("  {} x{} — {} ({})", line.name, line.quantity, line.line_total(), line.product_id);
    }
    println!("  total: {} ({} items)", snapshot.subtotal, snapshot.item_count);
}

fn print_help() {
    println!("commands:");
    println!("  products                 list the catalog");
    println!("  add <n> [qty]            add catalog item n to the cart");
    println!("  dec <product-id>         remove one unit");
    println!("  qty <product-id> <n>     set an exact quantity");
    println!("  rm <product-id>          remove a line");
    println!("  cart | clear             show / empty the cart");
    println!("  login <email> <pass>     sign in (token is persisted)");
    println!("  logout | me              session");
    println!("  orders                   order history");
    println!("  checkout [points]        place the order");
    println!("  commissions | payouts    consultant dashboard");
    println!("  quit");
}
