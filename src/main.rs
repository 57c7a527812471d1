//! inventory-sync CLI.

use std::sync::Arc;

use clap::Parser;
use inventory_sync::config::{ConfigError, InventoryConfig};
use inventory_sync::domain::{ItemId, ItemStatus};
use inventory_sync::logging::{init_logger, LogConfig};
use inventory_sync::{
    InventoryContext, ItemForm, MutationError, MutationGateway, SyncEngine, SyncError, SyncStatus,
    ValidationError, VisibleItems,
};
use thiserror::Error;
use tracing::info;

mod cli;

use crate::cli::{AddArgs, Cli, Command, DiscountArgs, StatusArgs, WatchArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation(_) => 2,
            CliError::Mutation(e) if e.is_retryable() => 75,
            _ => 1,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig::default()
        .with_level(cli.log_level.into())
        .with_json(cli.log_json);
    if let Err(error) = init_logger(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            error.exit_code()
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = InventoryConfig::resolve(&cli.config)?;

    match cli.command {
        Command::Watch(args) => run_watch(&config, args).await,
        Command::Add(args) => run_add(&config, args).await,
        Command::Discount(args) => run_discount(&config, args).await,
        Command::Status(args) => run_status(&config, args).await,
        Command::Genres => {
            for genre in config.genres.iter() {
                println!("{genre}\t{}", config.genres.stock_code(genre));
            }
            Ok(())
        }
    }
}

fn gateway(config: &InventoryConfig) -> MutationGateway {
    let remote = config.remote();
    let engine = Arc::new(SyncEngine::new(Arc::clone(&remote)));
    MutationGateway::new(remote, engine, config.genres.clone()).with_echo(config.echo)
}

async fn run_watch(config: &InventoryConfig, args: WatchArgs) -> Result<(), CliError> {
    let engine = SyncEngine::new(config.remote());
    engine.start().await?;

    let context = InventoryContext::spawn(&engine, args.filter());
    let mut visible = context.watch();
    // The first snapshot may already be derived.
    visible.mark_changed();
    let result = loop {
        tokio::select! {
            changed = visible.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = visible.borrow_and_update().clone();
                if let SyncStatus::Degraded(e) = &current.status {
                    break Err(CliError::Sync(e.clone()));
                }
                if current.status == SyncStatus::Live {
                    print_visible(&current);
                    if args.once {
                        break Ok(());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break Ok(());
            }
        }
    };

    engine.stop();
    result
}

async fn run_add(config: &InventoryConfig, args: AddArgs) -> Result<(), CliError> {
    let gateway = gateway(config);
    let form = args.into_form(ItemForm::new(gateway.catalog()));
    let request = form.validate(gateway.catalog())?;

    let item = gateway.submit(request).await?;
    println!("{}\t{}", item.id, item.stock_code);
    Ok(())
}

async fn run_discount(config: &InventoryConfig, args: DiscountArgs) -> Result<(), CliError> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    gateway(config)
        .update_discount_date(&args.item_id(), date)
        .await?;
    println!("{}\t{}", args.id, date);
    Ok(())
}

async fn run_status(config: &InventoryConfig, args: StatusArgs) -> Result<(), CliError> {
    let id = ItemId::new(args.id);
    let status: ItemStatus = args.status.into();
    gateway(config).update_status(&id, status).await?;
    println!("{id}\t{status}");
    Ok(())
}

fn print_visible(visible: &VisibleItems) {
    println!("-- {} of {} items --", visible.items.len(), visible.total);
    for item in &visible.items {
        let discount = item
            .discount_date
            .map(|d| format!("\tdiscounted {d}"))
            .unwrap_or_default();
        println!(
            "{}\t{}\t¥{}\t{}\t[{}]{}",
            item.stock_code, item.title, item.price, item.status, item.id, discount
        );
    }
}
