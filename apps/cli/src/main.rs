#![deny(warnings)]

//! Headless CLI: load a catalog, apply intents to one profile and print the
//! resulting prices.

use anyhow::{bail, Context, Result};
use craft_core::StationKey;
use craft_runtime::{EngineConfig, Intent, ProfileBook};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: craft-calc --catalog <file.json> [--config <file.yaml>] \
[--import <profile.json>] [--add <recipe>]... [--add-for <item>]... \
[--price <item>=<price>]... [--byproduct-price <item>=<price>]... \
[--skill <profession>=<level>[+lavish]]... [--upgrade <table>|<profession>=<level>]... \
[--margin <m>] [--calorie-cost <c>] [--export <profile.json>]";

#[derive(Debug, Default)]
struct Args {
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    import: Option<PathBuf>,
    export: Option<PathBuf>,
    intents: Vec<Intent>,
    version: bool,
}

fn split_pair(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .with_context(|| format!("expected <name>=<value>, got {arg:?}"))
}

fn decimal(value: &str) -> Result<Decimal> {
    value
        .parse()
        .with_context(|| format!("not a number: {value:?}"))
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--catalog" => args.catalog = Some(value()?.into()),
            "--config" => args.config = Some(value()?.into()),
            "--import" => args.import = Some(value()?.into()),
            "--export" => args.export = Some(value()?.into()),
            "--add" => args.intents.push(Intent::AddRecipe { recipe: value()? }),
            "--add-for" => args.intents.push(Intent::AddRecipeForItem { item: value()? }),
            "--remove" => args.intents.push(Intent::RemoveRecipe { recipe: value()? }),
            "--price" => {
                let raw = value()?;
                let (item, price) = split_pair(&raw)?;
                args.intents.push(Intent::SetItemPrice {
                    item: item.to_string(),
                    price: decimal(price)?,
                });
            }
            "--byproduct-price" => {
                let raw = value()?;
                let (item, price) = split_pair(&raw)?;
                args.intents.push(Intent::SetByproductPrice {
                    item: item.to_string(),
                    price: decimal(price)?,
                });
            }
            "--skill" => {
                let raw = value()?;
                let (profession, level) = split_pair(&raw)?;
                let (level, lavish_workspace) = match level.strip_suffix("+lavish") {
                    Some(level) => (level, true),
                    None => (level, false),
                };
                args.intents.push(Intent::UpdateProfession {
                    profession: profession.to_string(),
                    level: level.parse().context("skill level")?,
                    lavish_workspace,
                });
            }
            "--upgrade" => {
                let raw = value()?;
                let (station, level) = split_pair(&raw)?;
                let station: StationKey = station.parse()?;
                args.intents.push(Intent::UpdateStationUpgrade {
                    station,
                    level: level.parse().context("upgrade level")?,
                });
            }
            "--margin" => args.intents.push(Intent::SetMargin { margin: decimal(&value()?)? }),
            "--calorie-cost" => args.intents.push(Intent::SetCalorieCost {
                calorie_cost: decimal(&value()?)?,
            }),
            "--version" => args.version = true,
            other => bail!("unknown argument {other:?}\n{USAGE}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let args = parse_args()?;
    if args.version {
        println!("craft-calc {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_SHA"));
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    info!(?config, "starting CLI");

    let mut book = ProfileBook::new(config.clone());
    let id = book.create(config.profile_name.clone());

    if let Some(path) = &args.catalog {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        book.dispatch(id, Intent::ReplaceCatalog { json })?;
    }
    if let Some(path) = &args.import {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        book.dispatch(id, Intent::ImportProfile { json })?;
    }
    if book.get(id)?.catalog.is_empty() {
        bail!("no recipes loaded\n{USAGE}");
    }

    for intent in args.intents {
        let kind = intent.kind();
        book.dispatch(id, intent)
            .with_context(|| format!("applying {kind}"))?;
    }

    let profile = book.get(id)?;
    println!(
        "Profile {} ({}) | recipes: {} | items: {}",
        profile.name,
        profile.id,
        profile.graph.recipes.len(),
        profile.graph.items.len()
    );
    print!("{}", profile.report());

    if let Some(path) = &args.export {
        std::fs::write(path, book.export(id)?)
            .with_context(|| format!("writing profile {}", path.display()))?;
        info!(path = %path.display(), "profile written");
    }
    Ok(())
}
