//! Lila CLI - Command line tool for the Lila Shop storefront backend.
//!
//! Commands:
//! - `lila voucher` - Check voucher codes against an order
//! - `lila login` / `lila logout` - Manage the stored session
//! - `lila address` - List saved addresses and GHN locations
//! - `lila checkout` - Place an order from the cart or a single product
//! - `lila momo-return` - Finish a MoMo payment
//! - `lila chat` - Follow the support chat
//! - `lila config` - Inspect configuration

mod commands;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    AddressArgs, ChatArgs, CheckoutArgs, ConfigArgs, LoginArgs, MomoReturnArgs, VoucherArgs,
};

/// Lila CLI - Talk to the Lila Shop storefront backend
#[derive(Parser)]
#[command(name = "lila")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate voucher codes
    Voucher(VoucherArgs),

    /// Sign in and store the session token
    Login(LoginArgs),

    /// Sign out and forget the session token
    Logout,

    /// Saved addresses and GHN locations
    Address(AddressArgs),

    /// Place an order
    Checkout(CheckoutArgs),

    /// Finish a MoMo payment after the redirect
    MomoReturn(MomoReturnArgs),

    /// Follow the customer-support chat
    Chat(ChatArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Voucher(args) => commands::voucher::run(args, &ctx).await,
        Commands::Login(args) => commands::auth::login(args, &ctx).await,
        Commands::Logout => commands::auth::logout(&ctx).await,
        Commands::Address(args) => commands::address::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::MomoReturn(args) => commands::checkout::momo_return(args, &ctx).await,
        Commands::Chat(args) => commands::chat::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
