//! Unscramble rules, driven with explicit instants.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use partyforge_game::{
    GameError, GameStatus, UnscrambleConfig, UnscrambleGame, WordList, WordSource,
};
use partyforge_protocol::{PlayerId, RoomId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Every round's secret is "planet".
fn one_word() -> Arc<dyn WordSource> {
    Arc::new(WordList::new().with_language("en", "planet"))
}

/// Rounds of 50 ms with a 20 ms cooldown.
fn game(rounds: u32) -> UnscrambleGame {
    let config = UnscrambleConfig {
        cooldown: ms(20),
        ..UnscrambleConfig::with_rounds(rounds, ms(50))
    };
    UnscrambleGame::new(RoomId::generate(), config, one_word())
}

fn started(rounds: u32) -> (UnscrambleGame, PlayerId, Instant) {
    let game = game(rounds);
    let player = game.add_player("alice").id;
    let t0 = Instant::now();
    game.start(t0).unwrap();
    (game, player, t0)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_new_game_waits_in_lobby() {
    let game = game(3);
    assert_eq!(game.status(), GameStatus::Lobby);
    assert_eq!(game.current_round(), 0);
    assert!(game.current_round_data().is_none());
    assert_eq!(game.next_timer(Instant::now()), None);
}

#[test]
fn test_add_player_first_caller_owns_room() {
    let game = game(1);
    let alice = game.add_player("alice");
    let bob = game.add_player("bob");

    assert_ne!(alice.id, bob.id);
    assert!(game.is_owner(&alice.id));
    assert!(!game.is_owner(&bob.id));
    assert_eq!(game.player_name(&bob.id).as_deref(), Some("bob"));
    assert_eq!(game.player_names(), vec!["alice", "bob"]);
    assert_eq!(game.player_count(), 2);
}

#[test]
fn test_start_twice_fails_already_started() {
    let (game, _, t0) = started(1);
    assert_eq!(game.status(), GameStatus::InProgress);
    assert_eq!(game.current_round(), 1);
    assert_eq!(game.start(t0), Err(GameError::AlreadyStarted));
    assert_eq!(game.status(), GameStatus::InProgress);
}

#[test]
fn test_advance_if_needed_one_round_end_to_end() {
    let (game, _, t0) = started(1);

    assert!(!game.advance_if_needed(t0 + ms(10)));

    assert!(game.advance_if_needed(t0 + ms(60)));
    assert_eq!(game.status(), GameStatus::InProgress);
    let snap = game.snapshot(t0 + ms(60), None);
    assert!(snap.round_over);
    // Cooldown counts from the 50 ms deadline.
    assert_eq!(snap.next_round_in_ms, Some(10));

    assert!(game.advance_if_needed(t0 + ms(100)));
    assert_eq!(game.status(), GameStatus::Finished);
    assert!(!game.advance_if_needed(t0 + ms(500)));
    assert_eq!(game.next_timer(t0 + ms(500)), None);
}

#[test]
fn test_advance_if_needed_late_call_catches_up() {
    let (game, _, t0) = started(1);
    // Deadline and cooldown both long past.
    assert!(game.advance_if_needed(t0 + ms(1000)));
    assert_eq!(game.status(), GameStatus::Finished);
}

#[test]
fn test_next_timer_tracks_deadline_then_cooldown() {
    let (game, player, t0) = started(2);
    assert_eq!(game.next_timer(t0), Some(t0 + ms(50)));

    game.submit_guess(&player, "planet", t0 + ms(10)).unwrap();
    assert_eq!(game.next_timer(t0 + ms(10)), Some(t0 + ms(30)));

    assert!(game.advance_if_needed(t0 + ms(30)));
    assert_eq!(game.current_round(), 2);
    assert_eq!(game.next_timer(t0 + ms(30)), Some(t0 + ms(80)));
}

#[test]
fn test_restart_resets_scores_and_keeps_roster() {
    let (game, player, t0) = started(1);
    game.submit_guess(&player, "planet", t0).unwrap();
    game.advance_if_needed(t0 + ms(100));
    assert_eq!(game.status(), GameStatus::Finished);

    let t1 = t0 + ms(200);
    game.restart(t1);

    assert_eq!(game.status(), GameStatus::InProgress);
    assert_eq!(game.current_round(), 1);
    assert_eq!(game.player(&player).unwrap().points, 0);
    assert_eq!(game.player_count(), 1);
    assert_eq!(game.next_timer(t1), Some(t1 + ms(50)));
    assert!(game.submit_guess(&player, "planet", t1).unwrap());
}

// ---------------------------------------------------------------------------
// Guessing
// ---------------------------------------------------------------------------

#[test]
fn test_submit_guess_correct_awards_points_once() {
    let (game, player, t0) = started(1);

    assert_eq!(game.submit_guess(&player, "planet", t0 + ms(5)), Ok(true));
    let points = game.player(&player).unwrap().points;
    assert!((1..=10).contains(&points));

    assert_eq!(game.submit_guess(&player, "planet", t0 + ms(6)), Ok(false));
    assert_eq!(game.submit_guess(&player, "anything", t0 + ms(6)), Ok(false));
    assert_eq!(game.player(&player).unwrap().points, points);
}

#[test]
fn test_submit_guess_normalizes_text() {
    let (game, player, t0) = started(1);
    assert_eq!(game.submit_guess(&player, "  PLA NET ", t0), Ok(true));
}

#[test]
fn test_submit_guess_wrong_or_empty_is_false() {
    let (game, player, t0) = started(1);
    assert_eq!(game.submit_guess(&player, "planets", t0), Ok(false));
    assert_eq!(game.submit_guess(&player, "   ", t0), Ok(false));
    assert_eq!(game.player(&player).unwrap().points, 0);
}

#[test]
fn test_submit_guess_in_lobby_fails_not_in_progress() {
    let game = game(1);
    let player = game.add_player("alice").id;
    assert_eq!(
        game.submit_guess(&player, "planet", Instant::now()),
        Err(GameError::NotInProgress)
    );
}

#[test]
fn test_submit_guess_unknown_player_fails() {
    let (game, _, t0) = started(1);
    let stranger = PlayerId::generate();
    assert_eq!(
        game.submit_guess(&stranger, "planet", t0),
        Err(GameError::PlayerNotFound(stranger.clone()))
    );
}

#[test]
fn test_submit_guess_after_deadline_is_false() {
    let (game, player, t0) = started(1);
    assert_eq!(game.submit_guess(&player, "planet", t0 + ms(60)), Ok(false));
    assert_eq!(game.player(&player).unwrap().points, 0);
}

#[test]
fn test_submit_guess_after_finish_is_false() {
    let (game, player, t0) = started(1);
    assert_eq!(game.submit_guess(&player, "planet", t0 + ms(100)), Ok(false));
    assert_eq!(game.status(), GameStatus::Finished);
    assert_eq!(
        game.submit_guess(&player, "planet", t0 + ms(101)),
        Err(GameError::NotInProgress)
    );
}

#[test]
fn test_submit_guess_only_first_correct_guess_wins() {
    let (game, alice, t0) = started(1);
    let bob = game.add_player("bob").id;

    assert_eq!(game.submit_guess(&bob, "planet", t0 + ms(1)), Ok(true));
    assert_eq!(game.submit_guess(&alice, "planet", t0 + ms(1)), Ok(false));

    assert!(game.player(&bob).unwrap().points > 0);
    assert_eq!(game.player(&alice).unwrap().points, 0);
    let snap = game.snapshot(t0 + ms(2), Some(&alice));
    assert_eq!(snap.round_winner.as_deref(), Some("bob"));
    assert_eq!(snap.solved_in_ms, Some(1));
}

#[test]
fn test_submit_guess_concurrent_correct_guesses_one_winner() {
    let (game, _, t0) = started(1);
    let players: Vec<PlayerId> = (0..16)
        .map(|i| game.add_player(&format!("p{i}")).id)
        .collect();

    let game = &game;
    let wins: usize = thread::scope(|scope| {
        let handles: Vec<_> = players
            .iter()
            .map(|player| scope.spawn(move || game.submit_guess(player, "planet", t0 + ms(1))))
            .collect();
        handles
            .into_iter()
            .map(|handle| usize::from(handle.join().unwrap().unwrap()))
            .sum()
    });

    assert_eq!(wins, 1);
    let scorers = players
        .iter()
        .filter(|p| game.player(p).unwrap().points > 0)
        .count();
    assert_eq!(scorers, 1);
}

#[test]
fn test_points_shrink_as_round_runs_out() {
    let config = UnscrambleConfig::with_rounds(1, Duration::from_secs(4));
    let game = UnscrambleGame::new(RoomId::generate(), config, one_word());
    let player = game.add_player("alice").id;
    let t0 = Instant::now();
    game.start(t0).unwrap();

    // One second of four left: ceil(10 * 0.25) = 3.
    assert!(game.submit_guess(&player, "planet", t0 + Duration::from_secs(3)).unwrap());
    assert_eq!(game.player(&player).unwrap().points, 3);
}

#[test]
fn test_instant_guess_earns_maximum() {
    let (game, player, t0) = started(1);
    game.submit_guess(&player, "planet", t0).unwrap();
    assert_eq!(game.player(&player).unwrap().points, 10);
}

#[test]
fn test_empty_word_pool_rounds_cannot_be_won() {
    let game = UnscrambleGame::new(
        RoomId::generate(),
        UnscrambleConfig::with_rounds(2, ms(50)),
        Arc::new(WordList::new()),
    );
    let player = game.add_player("alice").id;
    let t0 = Instant::now();
    game.start(t0).unwrap();
    assert_eq!(game.submit_guess(&player, "", t0), Ok(false));
    assert_eq!(game.submit_guess(&player, "planet", t0), Ok(false));
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[test]
fn test_update_progress_clamps_to_word_length() {
    let (game, player, t0) = started(1);
    assert!(game.update_progress(&player, 99, t0));
    assert_eq!(game.player(&player).unwrap().progress, 6);
    assert!(game.update_progress(&player, 2, t0));
    assert_eq!(game.player(&player).unwrap().progress, 2);
}

#[test]
fn test_update_progress_ignored_outside_live_round() {
    let (game, player, t0) = started(1);
    assert!(!game.update_progress(&player, 3, t0 + ms(60)));
    assert!(!game.update_progress(&PlayerId::generate(), 3, t0));
    assert_eq!(game.player(&player).unwrap().progress, 0);
}

#[test]
fn test_check_attempt_counts_letters_in_place() {
    let (game, player, t0) = started(1);
    assert_eq!(game.check_attempt(&player, "plaxxx", t0), Some(3));
    assert_eq!(game.check_attempt(&player, "PLANXX", t0), Some(4));
    assert_eq!(game.check_attempt(&player, "tenalp", t0), Some(0));
    assert_eq!(game.player(&player).unwrap().progress, 0);
    assert_eq!(game.check_attempt(&PlayerId::generate(), "planet", t0), None);
}

#[test]
fn test_correct_guess_fills_progress_and_next_round_resets_it() {
    let (game, player, t0) = started(2);
    game.submit_guess(&player, "planet", t0).unwrap();
    assert_eq!(game.player(&player).unwrap().progress, 6);

    game.advance_if_needed(t0 + ms(20));
    assert_eq!(game.current_round(), 2);
    assert_eq!(game.player(&player).unwrap().progress, 0);
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_hides_word_until_round_over() {
    let (game, player, t0) = started(1);

    let snap = game.snapshot(t0, Some(&player));
    assert_eq!(snap.word, None);
    assert_eq!(snap.word_length, 6);
    let mut letters: Vec<char> = snap.scrambled.unwrap().chars().collect();
    letters.sort_unstable();
    assert_eq!(letters, vec!['a', 'e', 'l', 'n', 'p', 't']);
    assert!(snap.is_owner);
    assert_eq!(snap.viewer_name.as_deref(), Some("alice"));
    assert_eq!(snap.remaining_ms, 50);

    game.submit_guess(&player, "planet", t0 + ms(5)).unwrap();
    let snap = game.snapshot(t0 + ms(5), None);
    assert_eq!(snap.word.as_deref(), Some("planet"));
    assert!(!snap.is_owner);
    assert_eq!(snap.remaining_ms, 0);
    assert_eq!(snap.next_round_in_ms, Some(20));
}

#[test]
fn test_snapshot_rounds_never_go_backwards() {
    let (game, _, t0) = started(3);
    let mut last_round = 0;
    let mut finished = false;

    for step in 0..100 {
        let snap = game.snapshot(t0 + ms(step * 5), None);
        assert!(snap.current_round >= last_round);
        if finished {
            assert_eq!(snap.status, GameStatus::Finished);
        }
        finished = snap.status == GameStatus::Finished;
        last_round = snap.current_round;
    }
    assert!(finished);
    assert_eq!(last_round, 3);
}

#[test]
fn test_snapshot_final_winner_names_top_scorer() {
    let (game, alice, t0) = started(1);
    game.add_player("bob");
    game.submit_guess(&alice, "planet", t0).unwrap();

    let snap = game.snapshot(t0 + ms(100), None);
    assert_eq!(snap.status, GameStatus::Finished);
    assert_eq!(snap.winner.as_deref(), Some("alice"));
    assert_eq!(snap.scores[0].name, "alice");
    assert_eq!(snap.scores[1].points, 0);
}

#[test]
fn test_snapshot_nobody_scored_no_winner() {
    let (game, _, t0) = started(1);
    let snap = game.snapshot(t0 + ms(100), None);
    assert_eq!(snap.winner.as_deref(), Some("No winner"));
}

#[test]
fn test_snapshot_serializes_status_snake_case() {
    let (game, _, t0) = started(1);
    let json = serde_json::to_value(game.snapshot(t0, None)).unwrap();
    assert_eq!(json["status"], "in_progress");
    assert_eq!(json["current_round"], 1);
}

#[test]
fn test_snapshot_with_overlong_duration_is_clamped() {
    let config: UnscrambleConfig =
        serde_json::from_str(r#"{"round_duration":{"secs":18446744073709551615,"nanos":0}}"#)
            .unwrap();
    let game = UnscrambleGame::new(RoomId::generate(), config, one_word());
    let player = game.add_player("alice").id;
    let t0 = Instant::now();
    game.start(t0).unwrap();

    let snap = game.snapshot(t0, Some(&player));
    assert_eq!(snap.round_duration_ms, partyforge_game::MAX_DURATION.as_millis() as u64);
    assert_eq!(game.submit_guess(&player, "planet", t0), Ok(true));
}
