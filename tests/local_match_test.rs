//! Tests for hot-seat matches played through a session.

mod common;

use std::sync::Arc;

use common::{Fault, FlakyGateway, service_over, setup_test_db, sign_up};
use tictactoe_arena::{
    Evaluation, LocalMatch, Mark, MatchOutcome, MoveError, PlayerStats, Position, SettlementError,
    Tier,
};

/// X takes the top row while O plays the middle row.
const X_WINS: [Position; 5] = [
    Position::TopLeft,
    Position::MiddleLeft,
    Position::TopCenter,
    Position::Center,
    Position::TopRight,
];

#[tokio::test]
async fn test_win_is_settled_for_session() {
    let (_db, repo) = setup_test_db();
    let session = sign_up(&repo, "alice");
    let service = service_over(Arc::new(repo.clone()));
    let mut game = LocalMatch::new(Some(session.clone()), Mark::X);

    for pos in &X_WINS[..4] {
        let report = game.play(*pos, &service).await.unwrap();
        assert_eq!(report.evaluation, Evaluation::InProgress);
        assert!(report.settlement.is_none());
    }

    let report = game.play(X_WINS[4], &service).await.unwrap();
    assert_eq!(
        report.evaluation,
        Evaluation::Finished(MatchOutcome::Win(Mark::X))
    );
    let stats = report.settlement.unwrap().unwrap();
    assert_eq!(stats, PlayerStats::new(5, 1, 1, Tier::Bronze));

    let history = repo.get_game_history(*session.user_id()).unwrap();
    assert_eq!(*history[0].moves_count(), 5);
}

#[tokio::test]
async fn test_local_player_as_o_loses() {
    let (_db, repo) = setup_test_db();
    let session = sign_up(&repo, "bob");
    let service = service_over(Arc::new(repo.clone()));
    let mut game = LocalMatch::new(Some(session), Mark::O);

    let mut last = None;
    for pos in X_WINS {
        last = Some(game.play(pos, &service).await.unwrap());
    }
    let stats = last.unwrap().settlement.unwrap().unwrap();
    assert_eq!(stats, PlayerStats::new(0, 1, 0, Tier::Bronze));
}

#[tokio::test]
async fn test_guest_match_not_settled() {
    let (_db, repo) = setup_test_db();
    let service = service_over(Arc::new(repo));
    let mut game = LocalMatch::new(None, Mark::X);

    let mut last = None;
    for pos in X_WINS {
        last = Some(game.play(pos, &service).await.unwrap());
    }
    let report = last.unwrap();
    assert!(report.evaluation.is_terminal());
    assert!(report.settlement.is_none());
}

#[tokio::test]
async fn test_moves_after_game_over_rejected() {
    let (_db, repo) = setup_test_db();
    let service = service_over(Arc::new(repo));
    let mut game = LocalMatch::new(None, Mark::X);

    for pos in X_WINS {
        game.play(pos, &service).await.unwrap();
    }
    let result = game.play(Position::BottomRight, &service).await;
    assert!(matches!(result, Err(MoveError::GameOver)));

    game.new_game();
    assert_eq!(game.game().evaluation(), Evaluation::InProgress);
    assert!(game.game().history().is_empty());
}

#[tokio::test]
async fn test_occupied_square_rejected() {
    let (_db, repo) = setup_test_db();
    let service = service_over(Arc::new(repo));
    let mut game = LocalMatch::new(None, Mark::X);

    game.play(Position::Center, &service).await.unwrap();
    let result = game.play(Position::Center, &service).await;
    assert!(matches!(
        result,
        Err(MoveError::SquareOccupied(Position::Center))
    ));
    assert_eq!(game.game().to_move(), Mark::O);
}

#[tokio::test]
async fn test_settlement_failure_does_not_undo_move() {
    let (_db, repo) = setup_test_db();
    let session = sign_up(&repo, "carol");
    let service = service_over(Arc::new(FlakyGateway::new(repo.clone(), Fault::FailSettleStats)));
    let mut game = LocalMatch::new(Some(session), Mark::X);

    let mut last = None;
    for pos in X_WINS {
        last = Some(game.play(pos, &service).await.unwrap());
    }
    let report = last.unwrap();
    assert!(matches!(
        report.settlement,
        Some(Err(SettlementError::Persistence(_)))
    ));
    assert_eq!(game.game().history().len(), 5);
    assert!(game.game().winning_line().is_some());
}
