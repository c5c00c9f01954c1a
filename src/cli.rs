//! Command-line interface for tictactoe_arena.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tictactoe_arena::{GiftKind, Mark, RewardKind};

/// Tic-tac-toe arena - match settlement, ranks and reward codes
#[derive(Parser, Debug)]
#[command(name = "tictactoe_arena")]
#[command(about = "Settle tic-tac-toe matches and redeem reward codes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "arena.toml")]
    pub config: PathBuf,

    /// Database file, overriding config and environment
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or upgrade the database schema
    Init,

    /// Create a player profile
    CreateProfile {
        /// Unique username
        username: String,
    },

    /// Evaluate a board such as "XXX.OO..."
    Evaluate {
        /// Nine cells: X, O, or . for empty
        board: String,
    },

    /// Play a hot-seat match and settle it for a player
    Play {
        /// Player to settle the match for (guest if omitted)
        #[arg(short, long)]
        user: Option<String>,

        /// Mark held by the player
        #[arg(long, default_value = "X")]
        mark: Mark,

        /// Moves in order, as indices 0-8 or labels like "center"
        #[arg(required = true)]
        moves: Vec<String>,
    },

    /// Show a player's stats, rank and balances
    Stats {
        /// Player username
        #[arg(short, long)]
        user: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Redeem one or more codes
    Redeem {
        /// Player username
        #[arg(short, long)]
        user: String,

        /// Codes to redeem, in order
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Create a redeem code (admin)
    AddCode {
        /// Code string players will enter
        code: String,

        /// Reward kind: gold, jewels, vipPass or allRewards
        #[arg(short, long)]
        kind: RewardKind,

        /// Override the default reward amount
        #[arg(short, long)]
        amount: Option<i64>,
    },

    /// Gift gold or gems to a player (admin)
    Gift {
        /// Player username
        #[arg(short, long)]
        user: String,

        /// Gift kind: gold or gems
        #[arg(short, long)]
        kind: GiftKind,

        /// Amount to credit
        #[arg(short, long, default_value = "100")]
        amount: i64,

        /// Recorded sender
        #[arg(long, default_value = "admin")]
        sent_by: String,
    },
}
