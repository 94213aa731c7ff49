//! Emoji explain rules, driven with explicit instants.

use std::sync::Arc;
use std::time::{Duration, Instant};

use partyforge_game::{
    CanvasItem, ExplainConfig, ExplainGame, GameError, GameStatus, WordList, WordSource,
};
use partyforge_protocol::{PlayerId, RoomId};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn one_word() -> Arc<dyn WordSource> {
    Arc::new(WordList::new().with_language("en", "planet"))
}

/// Rounds of 100 ms with a 20 ms cooldown, so the reveal marks fall on
/// 50 ms and 75 ms.
fn game(rounds: u32) -> ExplainGame {
    let config = ExplainConfig {
        cooldown: ms(20),
        ..ExplainConfig::with_rounds(rounds, ms(100))
    };
    ExplainGame::new(RoomId::generate(), config, one_word())
}

/// A started two-player game: (game, explainer, guesser, start).
fn started(rounds: u32) -> (ExplainGame, PlayerId, PlayerId, Instant) {
    let game = game(rounds);
    let alice = game.add_player("alice").id;
    let bob = game.add_player("bob").id;
    let t0 = Instant::now();
    game.start(t0).unwrap();
    let explainer = game.explainer().unwrap();
    let guesser = if explainer == alice { bob } else { alice };
    (game, explainer, guesser, t0)
}

fn item(id: &str, emoji: &str) -> CanvasItem {
    CanvasItem {
        id: id.to_string(),
        emoji: emoji.to_string(),
        x: 10.0,
        y: 20.0,
    }
}

fn shown_letters(masked: &str) -> usize {
    masked.chars().filter(|&c| c != '_').count()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_start_alone_fails_insufficient_players() {
    let game = game(1);
    game.add_player("alice");
    assert_eq!(
        game.start(Instant::now()),
        Err(GameError::InsufficientPlayers { needed: 2, found: 1 })
    );
    assert_eq!(game.status(), GameStatus::Lobby);
}

#[test]
fn test_start_twice_fails_already_started() {
    let (game, _, _, t0) = started(1);
    assert_eq!(game.start(t0), Err(GameError::AlreadyStarted));
}

#[test]
fn test_start_loads_word_and_emojis() {
    let (game, explainer, _, _) = started(1);
    let round = game.current_round_data().unwrap();
    assert_eq!(round.word, "planet");
    assert_eq!(round.emojis.len(), ExplainConfig::DEFAULT_EMOJIS_PER_ROUND);
    assert_eq!(game.round_emojis(), round.emojis);
    assert_eq!(game.word_length(), 6);
    assert_eq!(game.revealed_word(), "______");
    assert!(game.player(&explainer).is_some());
}

#[test]
fn test_explainer_rotates_through_sorted_ids() {
    let game = game(3);
    let mut ids: Vec<PlayerId> = ["alice", "bob", "carol"]
        .into_iter()
        .map(|name| game.add_player(name).id)
        .collect();
    ids.sort();

    let t0 = Instant::now();
    game.start(t0).unwrap();
    assert_eq!(game.explainer().as_ref(), Some(&ids[0]));

    // Round ends at 100 ms, next one starts after the 20 ms cooldown.
    game.advance_if_needed(t0 + ms(120));
    assert_eq!(game.current_round(), 2);
    assert_eq!(game.explainer().as_ref(), Some(&ids[1]));

    game.advance_if_needed(t0 + ms(240));
    assert_eq!(game.current_round(), 3);
    assert_eq!(game.explainer().as_ref(), Some(&ids[2]));
}

#[test]
fn test_restart_needs_enough_players() {
    let config = ExplainConfig {
        min_players: 3,
        ..ExplainConfig::with_rounds(1, ms(100))
    };
    let game = ExplainGame::new(RoomId::generate(), config, one_word());
    game.add_player("alice");
    game.add_player("bob");
    assert_eq!(
        game.restart(Instant::now()),
        Err(GameError::InsufficientPlayers { needed: 3, found: 2 })
    );

    game.add_player("carol");
    assert!(game.restart(Instant::now()).is_ok());
    assert_eq!(game.status(), GameStatus::InProgress);
}

#[test]
fn test_restart_zeroes_scores() {
    let (game, explainer, guesser, t0) = started(1);
    game.submit_guess(&guesser, "planet", t0).unwrap();
    game.advance_if_needed(t0 + ms(200));
    assert_eq!(game.status(), GameStatus::Finished);

    let t1 = t0 + ms(300);
    game.restart(t1).unwrap();
    assert_eq!(game.current_round(), 1);
    assert_eq!(game.player(&guesser).unwrap().points, 0);
    assert_eq!(game.player(&explainer).unwrap().points, 0);
    assert_eq!(game.revealed_word(), "______");
}

// ---------------------------------------------------------------------------
// Guessing
// ---------------------------------------------------------------------------

#[test]
fn test_submit_guess_explainer_is_rejected() {
    let (game, explainer, _, t0) = started(1);
    assert_eq!(
        game.submit_guess(&explainer, "planet", t0),
        Err(GameError::ExplainerCannotGuess)
    );
}

#[test]
fn test_submit_guess_pays_guesser_and_explainer() {
    let (game, explainer, guesser, t0) = started(1);

    assert_eq!(game.submit_guess(&guesser, " Planet ", t0), Ok(true));
    assert_eq!(game.player(&guesser).unwrap().points, 10);
    assert_eq!(game.player(&explainer).unwrap().points, 5);

    assert_eq!(game.submit_guess(&guesser, "planet", t0 + ms(1)), Ok(false));
    assert_eq!(game.player(&guesser).unwrap().points, 10);
}

#[test]
fn test_submit_guess_late_awards_stay_ordered() {
    let (game, explainer, guesser, t0) = started(1);
    game.submit_guess(&guesser, "planet", t0 + ms(95)).unwrap();

    let guesser_points = game.player(&guesser).unwrap().points;
    let explainer_points = game.player(&explainer).unwrap().points;
    assert!((1..10).contains(&guesser_points));
    assert!(explainer_points >= 1);
    assert!(guesser_points >= explainer_points);
}

#[test]
fn test_submit_guess_wrong_word_is_false() {
    let (game, _, guesser, t0) = started(1);
    assert_eq!(game.submit_guess(&guesser, "planets", t0), Ok(false));
    assert_eq!(game.player(&guesser).unwrap().points, 0);
}

#[test]
fn test_submit_guess_in_lobby_fails_not_in_progress() {
    let game = game(1);
    let alice = game.add_player("alice").id;
    assert_eq!(
        game.submit_guess(&alice, "planet", Instant::now()),
        Err(GameError::NotInProgress)
    );
}

#[test]
fn test_submit_guess_unknown_player_fails() {
    let (game, _, _, t0) = started(1);
    let stranger = PlayerId::generate();
    assert_eq!(
        game.submit_guess(&stranger, "planet", t0),
        Err(GameError::PlayerNotFound(stranger.clone()))
    );
}

#[test]
fn test_submit_guess_after_timeout_is_false() {
    let (game, _, guesser, t0) = started(2);
    assert_eq!(game.submit_guess(&guesser, "planet", t0 + ms(110)), Ok(false));
    assert_eq!(game.player(&guesser).unwrap().points, 0);
}

// ---------------------------------------------------------------------------
// Letter reveals
// ---------------------------------------------------------------------------

#[test]
fn test_reveal_letters_at_half_and_three_quarters() {
    let (game, _, guesser, t0) = started(1);

    assert!(!game.reveal_letters_if_needed(t0 + ms(10)));
    assert_eq!(game.snapshot(t0 + ms(10), Some(&guesser)).revealed_word, "______");

    assert!(game.reveal_letters_if_needed(t0 + ms(50)));
    let half = game.revealed_word();
    assert_eq!(shown_letters(&half), 1);
    assert!(!game.reveal_letters_if_needed(t0 + ms(60)));

    assert!(game.reveal_letters_if_needed(t0 + ms(75)));
    let late = game.revealed_word();
    assert_eq!(shown_letters(&late), 2);
    assert!(!game.reveal_letters_if_needed(t0 + ms(90)));

    // Revealed letters are real, stay put, and are never hidden again.
    for ((shown, before), actual) in late.chars().zip(half.chars()).zip("planet".chars()) {
        if shown != '_' {
            assert_eq!(shown, actual);
        }
        if before != '_' {
            assert_eq!(shown, before);
        }
    }
}

#[test]
fn test_reveal_catches_up_after_missed_mark() {
    let (game, _, _, t0) = started(1);
    assert!(game.reveal_letters_if_needed(t0 + ms(80)));
    assert_eq!(shown_letters(&game.revealed_word()), 2);
}

#[test]
fn test_reveal_skipped_once_round_solved() {
    let (game, _, guesser, t0) = started(1);
    game.submit_guess(&guesser, "planet", t0 + ms(10)).unwrap();
    assert!(!game.reveal_letters_if_needed(t0 + ms(60)));
}

#[test]
fn test_next_timer_stops_at_reveal_marks() {
    let (game, _, _, t0) = started(1);
    assert_eq!(game.next_timer(t0), Some(t0 + ms(50)));
    assert_eq!(game.next_timer(t0 + ms(50)), Some(t0 + ms(75)));
    assert_eq!(game.next_timer(t0 + ms(80)), Some(t0 + ms(100)));
}

#[test]
fn test_next_timer_none_outside_play() {
    let game = game(1);
    assert_eq!(game.next_timer(Instant::now()), None);
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

#[test]
fn test_update_canvas_only_by_explainer() {
    let (game, explainer, guesser, t0) = started(1);

    assert!(!game.update_canvas(&guesser, vec![item("a", "🌍")], t0));
    assert!(game.canvas().is_empty());

    assert!(game.update_canvas(&explainer, vec![item("a", "🌍"), item("b", "🚀")], t0));
    assert_eq!(game.canvas().len(), 2);

    assert!(game.update_canvas(&explainer, vec![item("c", "⭐")], t0));
    assert_eq!(game.canvas(), vec![item("c", "⭐")]);
}

#[test]
fn test_update_canvas_in_lobby_is_ignored() {
    let game = game(1);
    let alice = game.add_player("alice").id;
    assert!(!game.update_canvas(&alice, vec![item("a", "🌍")], Instant::now()));
}

#[test]
fn test_next_round_clears_canvas_and_reveals() {
    let (game, explainer, _, t0) = started(2);
    game.update_canvas(&explainer, vec![item("a", "🌍")], t0);
    game.reveal_letters_if_needed(t0 + ms(80));

    game.advance_if_needed(t0 + ms(120));
    assert_eq!(game.current_round(), 2);
    assert!(game.canvas().is_empty());
    assert_eq!(game.revealed_word(), "______");
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[test]
fn test_snapshot_word_visible_to_explainer_only() {
    let (game, explainer, guesser, t0) = started(1);

    let own = game.snapshot(t0, Some(&explainer));
    assert_eq!(own.word.as_deref(), Some("planet"));
    assert!(own.is_explainer);
    assert!(!own.is_guesser);

    let other = game.snapshot(t0, Some(&guesser));
    assert_eq!(other.word, None);
    assert!(other.is_guesser);
    assert_eq!(other.revealed_word, "______");
    assert_eq!(other.word_length, 6);

    let anonymous = game.snapshot(t0, None);
    assert!(!anonymous.is_guesser);
    assert!(!anonymous.is_explainer);
}

#[test]
fn test_snapshot_reveals_word_once_round_over() {
    let (game, _, guesser, t0) = started(1);
    game.submit_guess(&guesser, "planet", t0 + ms(5)).unwrap();

    let snap = game.snapshot(t0 + ms(6), Some(&guesser));
    assert!(snap.round_over);
    assert_eq!(snap.revealed_word, "planet");
    assert_eq!(snap.round_winner, game.player_name(&guesser));
}

#[test]
fn test_snapshot_lists_players_by_name_with_explainer_flag() {
    let (game, explainer, _, t0) = started(1);
    let snap = game.snapshot(t0, None);

    let names: Vec<&str> = snap.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    let flagged: Vec<&PlayerId> = snap
        .players
        .iter()
        .filter(|p| p.is_explainer)
        .map(|p| &p.id)
        .collect();
    assert_eq!(flagged, vec![&explainer]);
    assert_eq!(snap.explainer_id.as_ref(), Some(&explainer));
    assert_eq!(snap.explainer_name, game.player_name(&explainer));
}

#[test]
fn test_snapshot_finished_names_winner() {
    let (game, _, guesser, t0) = started(1);
    game.submit_guess(&guesser, "planet", t0).unwrap();

    let snap = game.snapshot(t0 + ms(50), None);
    assert_eq!(snap.status, GameStatus::Finished);
    assert_eq!(snap.winner, game.player_name(&guesser));
}

#[test]
fn test_snapshot_with_overlong_duration_is_clamped() {
    let config = ExplainConfig::with_rounds(1, Duration::from_secs(7_000_000_000_000_000_000));
    let game = ExplainGame::new(RoomId::generate(), config, one_word());
    game.add_player("alice");
    game.add_player("bob");
    let t0 = Instant::now();
    game.start(t0).unwrap();

    let snap = game.snapshot(t0, None);
    assert_eq!(snap.round_duration_ms, partyforge_game::MAX_DURATION.as_millis() as u64);
    assert_eq!(game.next_timer(t0), Some(t0 + partyforge_game::MAX_DURATION / 2));
    assert!(!game.reveal_letters_if_needed(t0));
}
