//! keeper - table-side combat and resource tracker

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use keeper::combat::{InitiativeEntry, ResetCondition, ResetType};
use keeper::db::Database;
use keeper::session::Session;
use keeper::store::SqliteStore;
use keeper::Config;

/// Tabletop RPG combat assistant
#[derive(Parser, Debug)]
#[command(name = "keeper", version, about = "Track initiative, hit points and consumables")]
struct Args {
    /// Config file (defaults to ./keeper.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the config
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every stored character
    Characters,
    /// Show the active combat's initiative order
    Order,
    /// Start a new combat: --combatant "Aragorn=17" per participant
    Start {
        #[arg(short, long, default_value = "Combat Encounter")]
        name: String,
        #[arg(short = 'c', long = "combatant", value_parser = parse_combatant, required = true)]
        combatants: Vec<(String, i32)>,
    },
    /// Advance the active combat by one turn
    Next,
    /// End the active combat
    End,
    /// Damage a character (by id or name)
    Damage { who: String, amount: u32 },
    /// Heal a character (by id or name)
    Heal { who: String, amount: u32 },
    /// Add or remove a condition
    Condition {
        who: String,
        label: String,
        #[arg(long)]
        remove: bool,
    },
    /// Spend charges of a consumable
    Use {
        who: String,
        consumable: String,
        #[arg(short, long, default_value_t = 1)]
        amount: u32,
    },
    /// Everyone takes a rest (short_rest or long_rest)
    Rest { kind: ResetCondition },
    /// Time passes (dawn or dusk)
    Time { event: ResetCondition },
}

fn parse_combatant(s: &str) -> Result<(String, i32), String> {
    let (who, initiative) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=INITIATIVE, got '{}'", s))?;
    let initiative = initiative
        .trim()
        .parse()
        .map_err(|_| format!("invalid initiative in '{}'", s))?;
    Ok((who.trim().to_string(), initiative))
}

fn print_order(round: u32, entries: &[InitiativeEntry]) {
    println!("Round {}", round);
    for entry in entries {
        let marker = if entry.is_current { ">>>" } else { "   " };
        let kind = entry.kind.map(|k| k.as_str()).unwrap_or("unknown");
        let status = if entry.is_active { "" } else { " [out]" };
        println!(
            "{} {:>3}: {} ({}) HP {}{}",
            marker, entry.initiative, entry.name, kind, entry.hp, status
        );
        if !entry.conditions.is_empty() {
            println!("         conditions: {}", entry.conditions);
        }
        if !entry.consumables.is_empty() {
            println!("         consumables: {}", entry.consumables);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if let Some(db_path) = args.database {
        config.db_path = Some(db_path);
    }

    keeper::init_tracing(&config.log_filter);

    let db = Database::new(config.db_path.as_deref()).await?;
    let store = Arc::new(SqliteStore::new(db.pool().clone()));
    let mut session = Session::new(store);
    session.load_roster().await?;
    session.resume_active_combat().await?;

    match args.command {
        Command::Characters => {
            for character in session.roster().iter() {
                let ac = character
                    .ac()
                    .map(|ac| ac.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} [{}] {} HP {} AC {}",
                    character.id(),
                    character.kind(),
                    character.name,
                    character.hp_display(),
                    ac
                );
                for line in character.consumables_display() {
                    println!("    {}", line);
                }
            }
        }
        Command::Order => match session.combat() {
            Some(combat) => print_order(
                combat.current_round(),
                &combat.initiative_order(session.roster()),
            ),
            None => println!("No active combat"),
        },
        Command::Start { name, combatants } => {
            let mut seats = Vec::with_capacity(combatants.len());
            for (who, initiative) in &combatants {
                let character = session
                    .roster()
                    .find(who)
                    .ok_or_else(|| anyhow!("Unknown character: {}", who))?
                    .clone();
                seats.push((character, *initiative));
            }
            let combat = session.begin_combat(&name);
            for (character, initiative) in &seats {
                combat.add_character(character, *initiative);
            }
            if !combat.start() {
                bail!("A combat needs at least one participant");
            }
            session.save().await?;
            if let Some(combat) = session.combat() {
                print_order(combat.current_round(), &combat.initiative_order(session.roster()));
            }
        }
        Command::Next => {
            let combat = session
                .combat_mut()
                .ok_or_else(|| anyhow!("No active combat"))?;
            combat.next_turn();
            session.save().await?;
            if let Some(combat) = session.combat() {
                match combat.current_character(session.roster()) {
                    Some(character) => println!(
                        "Round {}, {}'s turn",
                        combat.current_round(),
                        character.name
                    ),
                    None => println!("Round {}", combat.current_round()),
                }
            }
        }
        Command::End => {
            if !session.end_combat() {
                bail!("No active combat");
            }
            session.save().await?;
            println!("Combat ended");
        }
        Command::Damage { who, amount } => {
            let character = session
                .roster_mut()
                .find_mut(&who)
                .ok_or_else(|| anyhow!("Unknown character: {}", who))?;
            character.take_damage(amount);
            println!("{}: HP {}", character.name, character.hp_display());
            session.save().await?;
        }
        Command::Heal { who, amount } => {
            let character = session
                .roster_mut()
                .find_mut(&who)
                .ok_or_else(|| anyhow!("Unknown character: {}", who))?;
            character.heal(amount);
            println!("{}: HP {}", character.name, character.hp_display());
            session.save().await?;
        }
        Command::Condition { who, label, remove } => {
            let character = session
                .roster_mut()
                .find_mut(&who)
                .ok_or_else(|| anyhow!("Unknown character: {}", who))?;
            if remove {
                character.remove_condition(&label);
            } else {
                character.add_condition(&label);
            }
            let conditions: Vec<&str> = character.conditions().collect();
            println!("{}: {}", character.name, conditions.join(", "));
            session.save().await?;
        }
        Command::Use {
            who,
            consumable,
            amount,
        } => {
            let character = session
                .roster_mut()
                .find_mut(&who)
                .ok_or_else(|| anyhow!("Unknown character: {}", who))?;
            if !character.use_consumable(&consumable, amount) {
                bail!("{} cannot spend {} of {}", character.name, amount, consumable);
            }
            if let Some(c) = character.get_consumable(&consumable) {
                println!("{}: {}", character.name, c);
            }
            session.save().await?;
        }
        Command::Rest { kind } => {
            if kind.reset_type() != ResetType::Rest {
                bail!("{} is not a rest; use short_rest or long_rest", kind);
            }
            let recovered = session.rest(kind).await?;
            println!("{}: {} consumables recovered", kind, recovered);
        }
        Command::Time { event } => {
            if event.reset_type() != ResetType::Time {
                bail!("{} is not a time of day; use dawn or dusk", event);
            }
            let recovered = session.time_passes(event).await?;
            println!("{}: {} consumables recovered", event, recovered);
        }
    }

    db.close().await;
    Ok(())
}
