use std::sync::Arc;
use std::time::{Duration, Instant};

use partyforge::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Bots
// ---------------------------------------------------------------------------

struct Bot {
    name: &'static str,
    /// How far into a round the bot works out the answer.
    solve_after: Duration,
}

static BOTS: [Bot; 2] = [
    Bot {
        name: "quick",
        solve_after: Duration::from_millis(1500),
    },
    Bot {
        name: "steady",
        solve_after: Duration::from_millis(2500),
    },
];

/// Plays like a client would: poll, type an attempt, report progress,
/// submit. Correct guesses publish and wake the loop, as a guess handler
/// does.
async fn play(rooms: GameRooms<UnscrambleGame>, room_id: RoomId, player: PlayerId, bot: &Bot) {
    let mut poll = tokio::time::interval(Duration::from_millis(250));
    let mut last_progress = None;
    loop {
        poll.tick().await;
        let Ok(room) = rooms.room(&room_id) else {
            return;
        };
        let game = room.state();
        if game.status().is_finished() {
            return;
        }
        let now = Instant::now();
        let snapshot = game.snapshot(now, Some(&player));
        if !snapshot.status.is_in_progress() || snapshot.round_over {
            last_progress = None;
            continue;
        }
        let Some(round) = game.current_round_data() else {
            continue;
        };

        let elapsed_ms = snapshot.round_duration_ms.saturating_sub(snapshot.remaining_ms);
        let elapsed = Duration::from_millis(elapsed_ms);
        let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
        let attempt = if elapsed >= bot.solve_after + jitter {
            round.word
        } else {
            let mut letters: Vec<char> = round.scrambled.chars().collect();
            letters.shuffle(&mut rand::rng());
            letters.into_iter().collect()
        };

        let progress = game.check_attempt(&player, &attempt, now);
        if progress.is_some() && progress != last_progress {
            last_progress = progress;
            rooms.publish(&room_id, RoomEvent::Players);
        }

        match game.submit_guess(&player, &attempt, now) {
            Ok(true) => {
                info!(bot = bot.name, word = %attempt, "bot solved the round");
                rooms.publish_all(&room_id, UNSCRAMBLE_ROUND_EVENTS);
                rooms.wake(&room_id);
            }
            Ok(false) => {}
            Err(err) => {
                warn!(bot = bot.name, %err, "bot stopped");
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), PartyError> {
    partyforge::telemetry::init();

    let rooms: GameRooms<UnscrambleGame> = GameRooms::new(Arc::new(WordList::builtin()));
    let config = UnscrambleConfig {
        cooldown: Duration::from_secs(1),
        ..UnscrambleConfig::with_rounds(3, Duration::from_secs(4))
    };
    let room_id = rooms.create_room(config);
    let mut viewer = rooms.broadcaster(&room_id).subscribe();
    let room = rooms.room(&room_id)?;

    let mut tasks = Vec::new();
    for bot in &BOTS {
        let player = room.state().add_player(bot.name);
        tasks.push(tokio::spawn(play(
            rooms.clone(),
            room_id.clone(),
            player.id,
            bot,
        )));
    }

    room.state().start(Instant::now())?;
    rooms.publish(&room_id, RoomEvent::Lobby);
    rooms.ensure_round_loop(&room_id);
    info!(%room_id, "game started");

    while let Some(event) = viewer.recv().await {
        let snapshot = room.state().snapshot(Instant::now(), None);
        match event {
            RoomEvent::Round => info!(
                round = snapshot.current_round,
                status = %snapshot.status,
                round_over = snapshot.round_over,
                word = ?snapshot.word,
                winner = ?snapshot.round_winner,
                "round"
            ),
            RoomEvent::Scores => {
                for entry in &snapshot.scores {
                    info!(player = %entry.name, points = entry.points, "score");
                }
            }
            RoomEvent::Players => {
                for entry in &snapshot.progress {
                    info!(player = %entry.name, correct = entry.correct, "progress");
                }
            }
            other => info!(event = %other, "event"),
        }
        if snapshot.status.is_finished() {
            info!(winner = ?snapshot.winner, "game over");
            break;
        }
    }

    for task in tasks {
        task.abort();
    }
    Ok(())
}
