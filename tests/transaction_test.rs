//! Tests for the transaction controller.

mod common;

use common::{CREATOR, Finality, FakeLedger, FakeNames, FakeSigner, Harness, OPPONENT, game};
use ledger_tictactoe::{ClientError, GameIdentifier, TransactionOutcome};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_play_space_payload() {
    let h = Harness::basic();
    h.transactions(TIMEOUT).play_space(&game("g"), 4).await.unwrap();

    let payload = h.signer.last_payload().unwrap();
    assert_eq!(payload.function, "0x1::tic_tac_toe::play_space");
    assert_eq!(payload.arguments, vec![json!(CREATOR), json!("g"), json!(4)]);
    assert_eq!(payload.payload_type, "entry_function_payload");
}

#[tokio::test]
async fn test_out_of_range_move_is_not_submitted() {
    let h = Harness::basic();
    let result = h.transactions(TIMEOUT).play_space(&game("g"), 9).await;
    assert_eq!(result, Err(ClientError::InvalidMove(9)));
    assert_eq!(h.signer.call_count(), 0);
}

#[tokio::test]
async fn test_start_game_returns_identifier() {
    let h = Harness::basic();
    let id = h
        .transactions(TIMEOUT)
        .start_game("  ", CREATOR, OPPONENT)
        .await
        .unwrap();
    assert_eq!(id, GameIdentifier::new(CREATOR, "default"));

    let payload = h.signer.last_payload().unwrap();
    assert_eq!(payload.function, "0x1::tic_tac_toe::start_game");
    assert_eq!(payload.arguments, vec![json!("default"), json!(CREATOR), json!(OPPONENT)]);
}

#[tokio::test]
async fn test_start_game_rejects_reserved_name() {
    let h = Harness::basic();
    let result = h.transactions(TIMEOUT).start_game("a:b", CREATOR, OPPONENT).await;
    assert!(matches!(result, Err(ClientError::InvalidIdentifier(_))));
    assert_eq!(h.signer.call_count(), 0);
}

#[tokio::test]
async fn test_reset_payload() {
    let h = Harness::basic();
    h.transactions(TIMEOUT).reset_game(&game("g")).await.unwrap();
    let payload = h.signer.last_payload().unwrap();
    assert_eq!(payload.function, "0x1::tic_tac_toe::reset_game");
    assert_eq!(payload.arguments, vec![json!(CREATOR), json!("g")]);
}

#[tokio::test]
async fn test_delete_by_non_creator_makes_no_call() {
    let h = Harness::new(FakeLedger::new(), FakeSigner::new(OPPONENT), FakeNames::new());
    let result = h.transactions(TIMEOUT).delete_game(&game("g")).await;

    assert_eq!(
        result,
        Err(ClientError::Unauthorized {
            caller: OPPONENT.to_string(),
            creator: CREATOR.to_string(),
        })
    );
    assert_eq!(h.signer.call_count(), 0);
    assert_eq!(h.ledger.status_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_delete_by_creator() {
    let h = Harness::basic();
    h.transactions(TIMEOUT).delete_game(&game("g")).await.unwrap();
    let payload = h.signer.last_payload().unwrap();
    assert_eq!(payload.function, "0x1::tic_tac_toe::delete_game");
    assert_eq!(payload.arguments, vec![json!("g")]);
}

#[tokio::test]
async fn test_second_mutation_is_rejected_while_in_flight() {
    let h = Harness::new(
        FakeLedger::new(),
        FakeSigner::new(CREATOR).with_delay(Duration::from_millis(200)),
        FakeNames::new(),
    );
    let controller = h.transactions(TIMEOUT);

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.play_space(&game("g"), 0).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(controller.is_busy());

    let second = controller.play_space(&game("g"), 1).await;
    assert_eq!(second, Err(ClientError::TransactionInFlight));

    first.await.unwrap().unwrap();
    assert_eq!(h.signer.call_count(), 1);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_unconfirmed_transaction_times_out() {
    let h = Harness::basic();
    h.ledger.set_finality(Finality::PendingForever);

    let result = h
        .transactions(Duration::from_millis(100))
        .play_space(&game("g"), 0)
        .await;
    assert!(matches!(result, Err(ClientError::LedgerUnreachable(_))));
}

#[tokio::test]
async fn test_aborted_transaction_fails() {
    let h = Harness::basic();
    h.ledger.set_finality(Finality::Abort("Move abort: ESPACE_TAKEN".to_string()));

    let result = h.transactions(TIMEOUT).play_space(&game("g"), 0).await;
    assert_eq!(
        result,
        Err(ClientError::TransactionFailed("Move abort: ESPACE_TAKEN".to_string()))
    );
    assert_eq!(
        TransactionOutcome::of(&result),
        TransactionOutcome::Failed("Transaction failed: Move abort: ESPACE_TAKEN".to_string())
    );
}

#[tokio::test]
async fn test_declined_signature() {
    let h = Harness::new(
        FakeLedger::new(),
        FakeSigner::new(CREATOR).declining(),
        FakeNames::new(),
    );
    let result = h.transactions(TIMEOUT).reset_game(&game("g")).await;
    assert_eq!(result, Err(ClientError::TransactionRejected));
    assert_eq!(TransactionOutcome::of(&result), TransactionOutcome::Rejected);
}

#[tokio::test]
async fn test_creator_matches_padded_signer() {
    let padded = format!("0x{:0>64}", "abc");
    let h = Harness::new(FakeLedger::new(), FakeSigner::new(&padded), FakeNames::new());
    let controller = h.transactions(TIMEOUT);

    controller.delete_game(&game("g")).await.unwrap();
    assert_eq!(h.signer.call_count(), 1);

    let id = controller.start_game("g2", CREATOR, OPPONENT).await.unwrap();
    assert_eq!(id, GameIdentifier::new(CREATOR, "g2"));
}
