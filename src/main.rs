//! Tictactoe Arena - operator CLI

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use tictactoe_arena::{
    ArenaConfig, Board, Evaluation, GameRepository, LocalMatch, Mark, MatchOutcome,
    NewRedeemCode, Position, ProfileService, RedemptionHistory, Session, describe_reward,
    evaluate, reward_for, run_migrations,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ArenaConfig::load(Some(cli.config.as_path()))?;
    if let Some(db_path) = cli.db_path {
        config = config.with_database_path(db_path);
    }

    match cli.command {
        Command::Init => {
            run_migrations(config.database_path())?;
            println!("Database ready at {}", config.database_path());
            Ok(())
        }
        Command::CreateProfile { username } => create_profile(&config, username),
        Command::Evaluate { board } => evaluate_board(&board),
        Command::Play { user, mark, moves } => play(&config, user, mark, moves).await,
        Command::Stats { user, json } => show_stats(&config, &user, json),
        Command::Redeem { user, codes } => redeem_codes(&config, &user, codes).await,
        Command::AddCode { code, kind, amount } => {
            let reward = reward_for(kind, amount)?;
            let definition =
                repository(&config)?.create_redeem_code(&NewRedeemCode::new(code, &reward))?;
            println!(
                "Added code {} ({})",
                definition.code(),
                describe_reward(definition.reward())
            );
            Ok(())
        }
        Command::Gift {
            user,
            kind,
            amount,
            sent_by,
        } => {
            let repo = repository(&config)?;
            let session = sign_in(&repo, &user)?;
            let service = ProfileService::from_config(repo, &config);
            let balances = service
                .send_gift(*session.user_id(), kind, amount, &sent_by)
                .await?;
            println!(
                "Sent {amount} {kind} to {user}: points {}, gems {}",
                balances.points(),
                balances.gems()
            );
            Ok(())
        }
    }
}

fn repository(config: &ArenaConfig) -> Result<GameRepository> {
    run_migrations(config.database_path())?;
    Ok(GameRepository::new(config.database_path().clone())?)
}

fn sign_in(repo: &GameRepository, username: &str) -> Result<Session> {
    let profile = repo
        .get_profile_by_name(username)?
        .with_context(|| format!("No profile named '{username}'"))?;
    Ok(Session::from(&profile))
}

#[instrument(skip(config))]
fn create_profile(config: &ArenaConfig, username: String) -> Result<()> {
    let profile = repository(config)?.create_profile(username)?;
    info!(user_id = profile.id(), "Profile created");
    println!("Created profile {} (id {})", profile.username(), profile.id());
    Ok(())
}

fn evaluate_board(raw: &str) -> Result<()> {
    let board: Board = raw.parse()?;
    println!("{}\n", board.display());
    match evaluate(&board) {
        Evaluation::InProgress => println!("In progress"),
        Evaluation::Finished(MatchOutcome::Win(mark)) => println!("Winner: {mark}"),
        Evaluation::Finished(MatchOutcome::Draw) => println!("Draw!"),
    }
    Ok(())
}

#[instrument(skip(config))]
async fn play(
    config: &ArenaConfig,
    user: Option<String>,
    mark: Mark,
    moves: Vec<String>,
) -> Result<()> {
    let repo = repository(config)?;
    let session = user.map(|name| sign_in(&repo, &name)).transpose()?;
    let service = ProfileService::from_config(repo, config);
    let mut game = LocalMatch::new(session, mark);

    for raw in &moves {
        let Some(pos) = Position::from_label_or_number(raw) else {
            bail!("Unknown position '{raw}'");
        };
        let report = game.play(pos, &service).await?;
        println!("{}\n", game.game().board().display());

        match report.evaluation {
            Evaluation::InProgress => {
                println!("Next player: {}", game.game().to_move());
                continue;
            }
            Evaluation::Finished(MatchOutcome::Win(winner)) => println!("Player {winner} wins!"),
            Evaluation::Finished(MatchOutcome::Draw) => println!("It's a draw!"),
        }
        match report.settlement {
            Some(Ok(stats)) => println!(
                "Points {} | Played {} | Won {} | Rank {}",
                stats.points_total(),
                stats.games_played(),
                stats.games_won(),
                stats.tier()
            ),
            Some(Err(e)) => println!("Stats were not saved: {e}"),
            None => println!("Playing as guest, nothing saved"),
        }
        return Ok(());
    }
    Ok(())
}

fn show_stats(config: &ArenaConfig, user: &str, json: bool) -> Result<()> {
    let repo = repository(config)?;
    let session = sign_in(&repo, user)?;
    let user_id = *session.user_id();
    let stats = repo.get_stats(user_id)?;
    let balances = repo.get_balances(user_id)?;
    let aggregated = repo.get_aggregated_stats(user_id)?;

    if json {
        let value = serde_json::json!({
            "user": session,
            "stats": stats,
            "balances": balances,
            "results": aggregated,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", session.username());
    println!(
        "Rank {} | Points {} | Played {} | Won {} | Win rate {:.1}%",
        stats.tier(),
        stats.points_total(),
        stats.games_played(),
        stats.games_won(),
        aggregated.win_rate()
    );
    if let Some(needed) = stats.points_to_next_tier() {
        println!("{needed} points to next rank");
    }
    println!(
        "Gems {} | VIP {}",
        balances.gems(),
        balances.vip_tier().as_deref().unwrap_or(if *balances.vip() { "yes" } else { "no" })
    );
    Ok(())
}

async fn redeem_codes(config: &ArenaConfig, user: &str, codes: Vec<String>) -> Result<()> {
    let repo = repository(config)?;
    let session = sign_in(&repo, user)?;
    let service = ProfileService::from_config(repo, config);
    let mut history = RedemptionHistory::new();

    for code in &codes {
        match service.redeem_code(Some(&session), code, &mut history).await {
            Ok(redemption) => println!("You have successfully redeemed {}!", redemption.description()),
            Err(e) => println!("Redemption failed: {e}"),
        }
    }

    println!("\nRedemption history:");
    for entry in history.entries() {
        println!(
            "  {} {:<12} {:<9} {}",
            entry.at().format("%Y-%m-%d %H:%M:%S"),
            entry.code(),
            entry.status(),
            entry.kind_label()
        );
    }
    Ok(())
}
