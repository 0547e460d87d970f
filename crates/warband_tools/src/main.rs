//! Warband Tracker - Command-line tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warband_core::campaign::{CampaignData, ResourcePools};
use warband_core::roster::Roster;
use warband_core::session::{ArmySession, MoraleTest};
use warband_core::status::{Action, StatusFlag};
use warband_tools::config::load_rules;
use warband_tools::file_store::JsonFileStore;
use warband_tools::{read_file, report, Result, ToolError};

#[derive(Parser)]
#[command(name = "warband-tools")]
#[command(about = "Roster, campaign and game-state tools for Warband Tracker")]
struct Cli {
    /// Campaign rules override (RON)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a roster for structural problems
    Validate {
        /// Roster JSON file
        roster: PathBuf,
    },
    /// Show per-unit and total points
    Points {
        /// Roster JSON file
        roster: PathBuf,
    },
    /// Show the campaign leaderboard
    Standings {
        /// Campaign JSON file
        campaign: PathBuf,
    },
    /// Show an army's allowance and resource pools
    Resources {
        /// Campaign JSON file
        campaign: PathBuf,
        /// Roster JSON file
        roster: PathBuf,
        /// Army id in the campaign
        #[arg(long)]
        army: String,
    },
    /// Track game state in a JSON store file
    Track {
        /// Store file (created if missing)
        #[arg(long, default_value = "warband-state.json")]
        store: PathBuf,
        /// Roster JSON file
        #[arg(long)]
        roster: PathBuf,
        /// Army id (defaults to the roster's id)
        #[arg(long)]
        army: Option<String>,
        #[command(subcommand)]
        action: TrackAction,
    },
}

#[derive(Subcommand)]
enum TrackAction {
    /// Print every unit's state
    Show,
    /// Wound a unit
    Wound { unit: String },
    /// Heal a unit
    Heal { unit: String },
    /// Remove a model
    Kill { unit: String },
    /// Return a model
    Revive { unit: String },
    /// Activate a unit (hold, advance, rush, charge)
    Activate { unit: String, action: Action },
    /// Flip a status flag
    Toggle { unit: String, flag: StatusFlag },
    /// Start a morale test, optionally declaring the rolled result
    Morale {
        unit: String,
        #[arg(value_parser = parse_outcome)]
        result: Option<bool>,
    },
    /// Spend a spell token
    Cast { unit: String },
    /// Start the next round
    NewRound,
    /// Reset all unit state, deriving pools from a campaign file
    NewGame {
        /// Campaign JSON file
        #[arg(long)]
        campaign: Option<PathBuf>,
    },
}

fn parse_outcome(s: &str) -> std::result::Result<bool, String> {
    match s {
        "pass" | "passed" => Ok(true),
        "fail" | "failed" => Ok(false),
        other => Err(format!("expected pass or fail, got '{other}'")),
    }
}

fn load_roster(path: &Path) -> Result<Roster> {
    Ok(Roster::from_json(&read_file(path)?)?)
}

fn load_campaign(path: &Path) -> Result<CampaignData> {
    Ok(CampaignData::from_json(&read_file(path)?)?)
}

fn run(cli: Cli) -> Result<()> {
    let rules = load_rules(cli.rules.as_deref())?;

    match cli.command {
        Commands::Validate { roster } => {
            let roster = load_roster(&roster)?;
            let (text, issues) = report::validation(&roster);
            print!("{text}");
            if !issues.is_empty() {
                return Err(ToolError::Invalid(issues.len()));
            }
        }
        Commands::Points { roster } => {
            print!("{}", report::points(&load_roster(&roster)?));
        }
        Commands::Standings { campaign } => {
            print!("{}", report::standings(&load_campaign(&campaign)?, &rules));
        }
        Commands::Resources {
            campaign,
            roster,
            army,
        } => {
            let campaign = load_campaign(&campaign)?;
            let roster = load_roster(&roster)?;
            print!("{}", report::resources(&campaign, &rules, &army, &roster)?);
        }
        Commands::Track {
            store,
            roster,
            army,
            action,
        } => {
            let roster = load_roster(&roster)?;
            let army = army.unwrap_or_else(|| roster.id.clone());
            let store = JsonFileStore::open(store)?;
            let mut session = ArmySession::new(army, roster, store);

            match action {
                TrackAction::Show => {}
                TrackAction::Wound { unit } => {
                    if !session.wound(&unit)? {
                        tracing::info!("{unit} has nothing left to wound");
                    }
                }
                TrackAction::Heal { unit } => {
                    if !session.heal(&unit)? {
                        tracing::info!("{unit} is already at full health");
                    }
                }
                TrackAction::Kill { unit } => {
                    session.kill_model(&unit)?;
                }
                TrackAction::Revive { unit } => {
                    session.revive_model(&unit)?;
                }
                TrackAction::Activate { unit, action } => session.activate_unit(&unit, action)?,
                TrackAction::Toggle { unit, flag } => {
                    session.toggle_unit_status(&unit, flag)?;
                }
                TrackAction::Morale { unit, result } => match result {
                    Some(passed) => {
                        let outcome = session.handle_morale_result(&unit, passed)?;
                        println!("Morale: {outcome:?}");
                    }
                    None => match session.take_morale_test(&unit)? {
                        MoraleTest::AutoFailed(outcome) => {
                            println!("Already Shaken - automatic failure: {outcome:?}");
                        }
                        MoraleTest::RollRequired { quality } => {
                            println!("Roll a die: passes on {quality}+");
                        }
                    },
                },
                TrackAction::Cast { unit } => {
                    let index = session.spend_token(&unit)?;
                    println!("Spent token {}", index + 1);
                }
                TrackAction::NewRound => {
                    session.start_new_round();
                }
                TrackAction::NewGame { campaign } => {
                    let pools = match campaign {
                        Some(path) => ResourcePools::derive(
                            &load_campaign(&path)?,
                            &rules,
                            session.roster_points(),
                        ),
                        None => ResourcePools::default(),
                    };
                    session.new_game(pools);
                }
            }

            for event in session.drain_events() {
                tracing::debug!("{event:?}");
            }
            print!("{}", report::session_state(&mut session)?);
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
