//! Vivah Art Studio CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from VIVAHART_PASSWORD or stdin)
//! vh login -e asha@example.com
//!
//! # Browse
//! vh categories --tab all --more 1
//! vh best-sellers
//!
//! # Cart
//! vh cart add 6650f1c2a9b8e7d6c5b4a3f2 -q 2
//! vh cart update 6650f1c2a9b8e7d6c5b4a3f2 -- -1
//! vh cart show
//!
//! # Checkout, answering the payment prompt on stdin
//! vh checkout
//! vh checkout --outcome success --payment-id pay_123
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session
//! - `categories` / `best-sellers` - Catalog views
//! - `cart` - Show and edit the cart
//! - `wishlist` - Toggle wishlist entries
//! - `address` - Show the default shipping address
//! - `checkout` - Create an order and settle its payment
//! - `profile` / `orders` / `order` - Account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use vivahart_storefront::{Storefront, StorefrontConfig};

mod commands;

#[derive(Parser)]
#[command(name = "vh")]
#[command(author, version, about = "Vivah Art Studio storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (read from stdin when not given)
        #[arg(long, env = "VIVAHART_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Log out and wipe local storage
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Browse the rakhi category
    Categories {
        /// Subcategory tab id (`all` for every rakhi)
        #[arg(short, long)]
        tab: Option<String>,

        /// Extra rows to reveal
        #[arg(long, default_value_t = 0)]
        more: usize,
    },
    /// Show a random pick of best sellers
    BestSellers,
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Show the default shipping address
    Address,
    /// Create an order for the cart and settle its payment
    Checkout(commands::checkout::CheckoutArgs),
    /// Show the account profile
    Profile,
    /// List past orders
    Orders,
    /// Show one order
    Order {
        /// Order id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the total
    Show,
    /// Add a product
    Add {
        /// Product id
        id: String,

        /// Quantity to add (1-10)
        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },
    /// Change a line's quantity by a delta (0 or below removes it)
    Update {
        /// Product id
        id: String,

        /// Quantity change, e.g. 1 or -1
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        /// Product id
        id: String,

        /// New quantity
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// List wishlist entries
    Show,
    /// Add or remove a product
    Toggle {
        /// Product id
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vivahart_storefront=info,vivahart_cli=info".into());

    // Logs go to stderr; stdout is for command output.
    let json = std::env::var("VIVAHART_LOG_JSON").is_ok_and(|v| v == "1");
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry before the subscriber so the tracing layer has a client.
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let mut storefront = match Storefront::new(config) {
        Ok(storefront) => storefront,
        Err(e) => {
            tracing::error!("Could not start storefront: {e}");
            std::process::exit(1);
        }
    };

    let result = run(cli, &mut storefront).await;
    commands::print_notifications(&mut storefront);

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &mut Storefront) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(storefront, &email, password).await?;
        }
        Commands::Logout => commands::session::logout(storefront),
        Commands::Whoami => commands::session::whoami(storefront),
        Commands::Categories { tab, more } => {
            commands::catalog::categories(storefront, tab, more).await?;
        }
        Commands::BestSellers => commands::catalog::best_sellers(storefront).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await?,
            CartAction::Add { id, quantity } => {
                commands::cart::add(storefront, &id, quantity).await?;
            }
            CartAction::Update { id, delta } => {
                commands::cart::update(storefront, &id, delta).await?;
            }
            CartAction::Set { id, quantity } => {
                commands::cart::set(storefront, &id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(storefront, &id).await?,
            CartAction::Clear => commands::cart::clear(storefront).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::account::wishlist(storefront).await?,
            WishlistAction::Toggle { id } => {
                commands::account::toggle_wishlist(storefront, &id).await?;
            }
        },
        Commands::Address => commands::account::address(storefront).await?,
        Commands::Checkout(args) => commands::checkout::run(storefront, args).await?,
        Commands::Profile => commands::account::profile(storefront).await?,
        Commands::Orders => commands::account::orders(storefront).await?,
        Commands::Order { id } => commands::account::order(storefront, &id).await?,
    }
    Ok(())
}
