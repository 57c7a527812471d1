//! CLI argument definitions for inventory-sync.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use inventory_sync::config::InventoryConfig;
use inventory_sync::domain::{FilterState, ItemId, ItemStatus, Marketplace, Marketplaces};
use inventory_sync::ItemForm;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "inventory-sync",
    version,
    about = "Follow and edit a shared inventory collection"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults are used when it does not exist).
    #[arg(long, value_name = "PATH", default_value = InventoryConfig::FILE_NAME, global = true)]
    pub config: PathBuf,

    /// Log level; RUST_LOG overrides it.
    #[arg(long = "log-level", value_enum, default_value = "info", global = true)]
    pub log_level: LogLevelArg,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the filtered inventory list every time it changes.
    Watch(WatchArgs),

    /// Validate and add a new item.
    Add(AddArgs),

    /// Set the discount date of an item.
    Discount(DiscountArgs),

    /// Change the sales status of an item.
    Status(StatusArgs),

    /// List the genre catalog with the next stock code of each genre.
    Genres,
}

#[derive(Parser)]
pub struct WatchArgs {
    /// Case-insensitive substring of title or stock code.
    #[arg(long, default_value = "")]
    pub keyword: String,

    /// Exact genre to show.
    #[arg(long, default_value = "")]
    pub genre: String,

    /// Status to show; repeat to show several.
    #[arg(long = "status", value_enum)]
    pub statuses: Vec<StatusArg>,

    /// Exit after the first synchronized list.
    #[arg(long)]
    pub once: bool,
}

impl WatchArgs {
    pub fn filter(&self) -> FilterState {
        let mut filter = FilterState::default()
            .with_keyword(self.keyword.clone())
            .with_genre(self.genre.clone());
        for status in &self.statuses {
            filter = filter.with_status(ItemStatus::from(*status));
        }
        filter
    }
}

#[derive(Parser)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    /// Genre from the catalog (defaults to the first one).
    #[arg(long)]
    pub genre: Option<String>,

    /// Price in yen, digits only.
    #[arg(long)]
    pub price: String,

    #[arg(long, value_enum, default_value = "for-sale")]
    pub status: StatusArg,

    /// Sold date (YYYY-MM-DD).
    #[arg(long = "sold-date", default_value = "")]
    pub sold_date: String,

    /// Discount date (YYYY-MM-DD).
    #[arg(long = "discount-date", default_value = "")]
    pub discount_date: String,

    /// Image URL.
    #[arg(long, default_value = "")]
    pub image: String,

    /// Marketplace the item is listed on; repeat for several.
    #[arg(long = "marketplace", value_enum)]
    pub marketplaces: Vec<MarketplaceArg>,
}

impl AddArgs {
    pub fn into_form(self, base: ItemForm) -> ItemForm {
        let mut marketplaces = Marketplaces::default();
        for marketplace in self.marketplaces {
            marketplaces.set(marketplace.into(), true);
        }
        ItemForm {
            title: self.title,
            genre: self.genre.unwrap_or(base.genre),
            status: self.status.into(),
            price: self.price,
            sold_date: self.sold_date,
            discount_date: self.discount_date,
            image: self.image,
            marketplaces,
        }
    }
}

#[derive(Parser)]
pub struct DiscountArgs {
    #[arg(value_name = "ITEM_ID")]
    pub id: String,

    /// Discount date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl DiscountArgs {
    pub fn item_id(&self) -> ItemId {
        ItemId::new(self.id.clone())
    }
}

#[derive(Parser)]
pub struct StatusArgs {
    #[arg(value_name = "ITEM_ID")]
    pub id: String,

    #[arg(value_enum)]
    pub status: StatusArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    ForSale,
    ReservedSold,
    OnHold,
}

impl From<StatusArg> for ItemStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::ForSale => ItemStatus::ForSale,
            StatusArg::ReservedSold => ItemStatus::ReservedSold,
            StatusArg::OnHold => ItemStatus::OnHold,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MarketplaceArg {
    Mercari,
    Yahoo,
    Rakuma,
    Instagram,
}

impl From<MarketplaceArg> for Marketplace {
    fn from(marketplace: MarketplaceArg) -> Self {
        match marketplace {
            MarketplaceArg::Mercari => Marketplace::Mercari,
            MarketplaceArg::Yahoo => Marketplace::Yahoo,
            MarketplaceArg::Rakuma => Marketplace::Rakuma,
            MarketplaceArg::Instagram => Marketplace::Instagram,
        }
    }
}
