use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use paddlerank::config::Config;
use paddlerank::dashboard::write_dashboard;
use paddlerank::predict::predict;
use paddlerank::processor::MatchProcessor;
use paddlerank::store::RankStore;

#[derive(Parser)]
#[command(name = "paddlerank", version, about = "Table tennis ladder with uncertainty-aware ratings")]
struct Cli {
    /// SQLite database path (overrides RANKINGS_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new player
    AddPlayer { name: String },
    /// Log a decisive match
    RecordMatch {
        player1: i64,
        player2: i64,
        score1: i64,
        score2: i64,
    },
    /// Delete a match and recalculate all subsequent ratings
    DeleteMatch {
        match_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Remove a player and every match they played
    RemovePlayer {
        player_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Display current rankings
    Ladder,
    /// Display the win/loss table sorted by win percentage
    Wlt,
    /// Show head-to-head stats
    H2h { player1: i64, player2: i64 },
    /// View match history: omit the id for recent matches
    MatchHistory { player_id: Option<i64> },
    /// Show detailed player statistics
    PlayerStats { player_id: i64 },
    /// Estimate the win probability between two players
    Predict { player1: i64, player2: i64 },
    /// Write the static HTML dashboard
    Dashboard {
        /// Output directory (overrides DASHBOARD_DIR)
        #[arg(long)]
        out: Option<String>,
    },
    /// Delete ALL players, matches, and rankings
    ClearAllData {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = Config::from_env();
    if let Some(db) = cli.db {
        cfg.db_path = db;
    }
    let mut store = RankStore::open(&cfg.db_path)?;
    store.init()?;
    let mut proc = MatchProcessor::new(store, cfg.rating.clone());

    match cli.command {
        Command::AddPlayer { name } => {
            let player = proc.add_player(&name)?;
            println!("Created Player {}: {}", player.id, player.name);
        }
        Command::RecordMatch { player1, player2, score1, score2 } => {
            let m = proc.record_match(player1, player2, score1, score2)?;
            println!("Recorded Match {}", m.id);
        }
        Command::DeleteMatch { match_id, yes } => {
            if !yes
                && !confirm(&format!(
                    "WARNING: Deleting match {} will recalculate all subsequent ratings. Continue? (y/N) ",
                    match_id
                ))?
            {
                println!("Cancelled.");
                return Ok(());
            }
            proc.delete_match(match_id)?;
            println!("Deleted match {} and recalculated ratings", match_id);
        }
        Command::RemovePlayer { player_id, yes } => {
            if !yes
                && !confirm(&format!(
                    "WARNING: Removing player {} deletes their matches and recalculates ratings. Continue? (y/N) ",
                    player_id
                ))?
            {
                println!("Cancelled.");
                return Ok(());
            }
            proc.remove_player(player_id)?;
            println!("Removed player ID {} and associated matches", player_id);
        }
        Command::Ladder => {
            println!("\nCurrent Rankings:");
            for (idx, player) in proc.ladder()?.iter().enumerate() {
                println!(
                    "{}. {} (Rating: {:.1} ±{:.1})",
                    idx + 1,
                    player.name,
                    player.mu,
                    player.sigma
                );
            }
        }
        Command::Wlt => {
            println!("\nWin/Loss Table:");
            println!("{:<20} {:<6} {:<6} {:<6} {:<6}", "Player", "MP", "W", "L", "Win%");
            println!("{}", "-".repeat(45));
            for row in proc.win_loss_table()? {
                println!(
                    "{:<20} {:<6} {:<6} {:<6} {:<6.1}",
                    row.name, row.played, row.wins, row.losses, row.win_pct
                );
            }
        }
        Command::H2h { player1, player2 } => {
            let stats = proc.head_to_head(player1, player2)?;
            let name1 = player_name(&proc, player1);
            let name2 = player_name(&proc, player2);
            println!("\nHead-to-Head: {} vs {}", name1, name2);
            println!("Total Matches: {}", stats.total_matches);
            println!("Wins {}: {}", name1, stats.wins_p1);
            println!("Wins {}: {}", name2, stats.wins_p2);
        }
        Command::MatchHistory { player_id: Some(id) } => {
            let history = proc.match_history(id)?;
            println!("\nMatch History for {} (ID: {})", player_name(&proc, id), id);
            println!("{}", "-".repeat(60));
            for entry in history {
                let outcome = if entry.won { "WON" } else { "LOST" };
                println!(
                    "{} | {} {}-{} {} ({})",
                    entry.timestamp, entry.player1, entry.score1, entry.score2, entry.player2, outcome
                );
            }
        }
        Command::MatchHistory { player_id: None } => {
            let matches = proc.recent_matches(cfg.recent_limit)?;
            if matches.is_empty() {
                println!("\nNo matches recorded yet");
                return Ok(());
            }
            println!("\nLast {} Recent Matches", cfg.recent_limit);
            println!("{}", "-".repeat(40));
            for m in matches {
                println!("{} | {} {}-{} {}", m.timestamp, m.player1, m.score1, m.score2, m.player2);
            }
        }
        Command::PlayerStats { player_id } => {
            let stats = proc.player_stats(player_id)?;
            let p = &stats.player;
            let win_pct = if stats.total_matches > 0 {
                stats.wins as f64 / stats.total_matches as f64 * 100.0
            } else {
                0.0
            };
            println!("\nPlayer Statistics: {} (ID: {})", p.name, p.id);
            println!("Current Rating: {:.1} ±{:.1}", p.mu, p.sigma);
            println!("Peak Rating:    {:.1}", stats.peak_rating);
            println!("Matches Played: {}", stats.total_matches);
            println!("W/L Record:     {}-{}", stats.wins, stats.losses);
            println!("Win Percentage: {:.1}%", win_pct);
            println!("\nNemesis:       {} ({:.1}% win rate)", stats.nemesis.name, stats.nemesis.rate * 100.0);
            println!("Victim:        {} ({:.1}% win rate)", stats.victim.name, stats.victim.rate * 100.0);
        }
        Command::Predict { player1, player2 } => {
            let p = predict(&proc, &cfg, player1, player2)?;
            println!("\n{} vs {}", p.player1_name, p.player2_name);
            println!("Historical model: {:.3}", p.model_historical);
            println!("Skill model:      {:.3}", p.model_skill);
            println!(
                "Blend ({:.0}/{:.0}):     {:.1}% vs {:.1}%",
                p.hist_weight * 100.0,
                p.skill_weight * 100.0,
                p.p1_win_probability * 100.0,
                p.p2_win_probability() * 100.0
            );
        }
        Command::Dashboard { out } => {
            let dir = out.unwrap_or_else(|| cfg.out_dir.clone());
            let pages = write_dashboard(&proc, Path::new(&dir), cfg.recent_limit)?;
            println!("Wrote {} pages to {}", pages, dir);
        }
        Command::ClearAllData { yes } => {
            if !yes {
                print!("WARNING: This will PERMANENTLY DELETE ALL DATA! Type 'DELETE' to confirm: ");
                io::stdout().flush()?;
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
                if line.trim() != "DELETE" {
                    println!("Clear operation cancelled.");
                    return Ok(());
                }
            }
            proc.clear_all_data()?;
            println!("Successfully erased all data. Database is now empty.");
        }
    }
    Ok(())
}

fn player_name(proc: &MatchProcessor, id: i64) -> String {
    proc.player(id)
        .map(|p| p.name)
        .unwrap_or_else(|_| "Unknown Player".to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
