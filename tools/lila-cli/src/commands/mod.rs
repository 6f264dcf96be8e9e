//! CLI command implementations.

pub mod address;
pub mod auth;
pub mod chat;
pub mod checkout;
pub mod config;
pub mod voucher;

use clap::{Args, Subcommand, ValueEnum};
use lila_commerce::checkout::PaymentMethod;

/// Arguments for the voucher command.
#[derive(Args)]
pub struct VoucherArgs {
    #[command(subcommand)]
    pub command: VoucherCommand,
}

#[derive(Subcommand)]
pub enum VoucherCommand {
    /// Check a code against an order and show the discount.
    Check {
        /// Voucher code.
        code: String,

        /// Order total in dong.
        #[arg(short, long)]
        total: i64,

        /// Product ids in the order.
        #[arg(short, long = "product")]
        products: Vec<String>,

        /// Category ids in the order.
        #[arg(short = 'g', long = "category")]
        categories: Vec<String>,
    },
    /// Normalize a typed code and check its format.
    Format {
        /// Voucher code as typed.
        code: String,
    },
    /// List active vouchers usable for an order total.
    List {
        /// Order total in dong.
        #[arg(short, long)]
        total: i64,

        /// Show every active voucher, not only usable ones.
        #[arg(short, long)]
        all: bool,
    },
}

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Account email.
    pub email: String,

    /// Password (prompted when omitted).
    pub password: Option<String>,
}

/// Arguments for the address command.
#[derive(Args)]
pub struct AddressArgs {
    #[command(subcommand)]
    pub command: AddressCommand,
}

#[derive(Subcommand)]
pub enum AddressCommand {
    /// List saved shipping addresses.
    List,
    /// List GHN provinces.
    Provinces,
    /// List GHN districts of a province.
    Districts {
        /// Province id.
        province: i64,
    },
    /// List GHN wards of a district.
    Wards {
        /// District id.
        district: i64,
    },
    /// Make a saved address the default.
    SetDefault {
        /// Address id.
        id: String,
    },
}

/// Payment method accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PaymentArg {
    /// Cash on delivery.
    Cod,
    /// MoMo wallet.
    Momo,
}

impl From<PaymentArg> for PaymentMethod {
    fn from(arg: PaymentArg) -> Self {
        match arg {
            PaymentArg::Cod => PaymentMethod::Cod,
            PaymentArg::Momo => PaymentMethod::Momo,
        }
    }
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Cart item ids to buy (default: the whole cart).
    #[arg(short, long = "item", conflicts_with = "direct")]
    pub items: Vec<String>,

    /// Buy one product directly instead of the cart.
    #[arg(long, value_name = "PRODUCT")]
    pub direct: Option<String>,

    /// Variant of the direct product.
    #[arg(long, requires = "direct")]
    pub variant: Option<String>,

    /// Quantity of the direct product.
    #[arg(long, default_value = "1", requires = "direct")]
    pub qty: i64,

    /// Ship to this saved address instead of the default.
    #[arg(short, long)]
    pub address: Option<String>,

    /// Voucher code to apply.
    #[arg(long)]
    pub voucher: Option<String>,

    /// Payment method.
    #[arg(short, long, value_enum)]
    pub payment: PaymentArg,

    /// Skip confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Show the summary without placing the order.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the momo-return command.
#[derive(Args)]
pub struct MomoReturnArgs {
    /// The `resultCode` MoMo redirected back with.
    pub result_code: String,
}

/// Arguments for the chat command.
#[derive(Args)]
pub struct ChatArgs {
    #[command(subcommand)]
    pub command: ChatCommand,
}

#[derive(Subcommand)]
pub enum ChatCommand {
    /// Open the chat and print new messages until interrupted.
    Tail {
        /// Talk to this user instead of the assigned support agent.
        #[arg(short, long)]
        partner: Option<String>,
    },
    /// Send one message.
    Send {
        /// Message text.
        text: String,

        /// Recipient (default: the assigned support agent).
        #[arg(short, long)]
        partner: Option<String>,
    },
    /// Show the unread message count.
    Unread,
    /// Follow every conversation as support staff.
    Desk,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Write a default lila.toml in the working directory.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
