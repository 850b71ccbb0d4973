//! # Emoji Trail - Simulated Players
//!
//! Connects a number of bot players to one room and keeps them busy:
//! each bot wanders around the 800x600 play field sending `playerUpdate`
//! frames, now and then reports an `emojiCollected`, and counts what the
//! server sends back. A summary is logged when the run ends.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{interval, sleep, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "simulate")]
#[command(about = "Emoji Trail - simulated players for load and protocol testing")]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "ws://127.0.0.1:8004")]
    url: String,

    /// Room the bots join
    #[arg(short, long, default_value = "bots")]
    room: String,

    /// Number of simultaneous bots
    #[arg(short, long, default_value = "3")]
    players: u32,

    /// Position updates per second per bot
    #[arg(short, long, default_value = "10.0")]
    move_freq: f64,

    /// Emoji collections per minute per bot
    #[arg(short, long, default_value = "6.0")]
    collect_freq: f64,

    /// Simulation duration in seconds
    #[arg(short, long, default_value = "60")]
    duration: u64,
}

const FIELD_WIDTH: f64 = 800.0;
const FIELD_HEIGHT: f64 = 600.0;
/// Pixels moved per update
const STEP: f64 = 5.0;
/// Board size of the trail game; collected indices fall in `0..BOARD_SIZE`
const BOARD_SIZE: u32 = 12;

/// One wandering bot.
#[derive(Debug)]
struct Bot {
    player_id: String,
    x: f64,
    y: f64,
    /// Current heading as a unit step `(dx, dy)`
    heading: (f64, f64),
    score: i64,
}

impl Bot {
    fn new(player_id: String, rng: &mut impl Rng) -> Self {
        Self {
            player_id,
            x: rng.gen_range(0.0..FIELD_WIDTH),
            y: rng.gen_range(0.0..FIELD_HEIGHT),
            heading: random_heading(rng),
            score: 0,
        }
    }

    /// Moves one step, turning now and then, and stays inside the field.
    fn step(&mut self, rng: &mut impl Rng) {
        if rng.gen_bool(0.1) {
            self.heading = random_heading(rng);
        }
        self.x = (self.x + self.heading.0 * STEP).clamp(0.0, FIELD_WIDTH);
        self.y = (self.y + self.heading.1 * STEP).clamp(0.0, FIELD_HEIGHT);
    }

    fn update_message(&self) -> Value {
        json!({
            "type": "playerUpdate",
            "data": { "x": self.x, "y": self.y, "score": self.score }
        })
    }

    fn collect_message(&mut self, rng: &mut impl Rng) -> Value {
        self.score += 1;
        json!({ "type": "emojiCollected", "emojiIndex": rng.gen_range(0..BOARD_SIZE) })
    }
}

/// Same four directions a keyboard player has.
fn random_heading(rng: &mut impl Rng) -> (f64, f64) {
    match rng.gen_range(0..4) {
        0 => (0.0, -1.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (1.0, 0.0),
    }
}

/// What one bot saw during its run.
#[derive(Debug, Default)]
struct BotReport {
    sent: u64,
    received: BTreeMap<String, u64>,
}

impl BotReport {
    fn record(&mut self, text: &str) {
        let kind = serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| value.get("type").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "unparsed".to_string());
        *self.received.entry(kind).or_insert(0) += 1;
    }

    fn merge(&mut self, other: BotReport) {
        self.sent += other.sent;
        for (kind, count) in other.received {
            *self.received.entry(kind).or_insert(0) += count;
        }
    }
}

async fn simulate_bot(
    player_id: String,
    args: Args,
) -> Result<BotReport, Box<dyn std::error::Error + Send + Sync>> {
    let url = format!("{}/ws/{}/{}", args.url.trim_end_matches('/'), args.room, player_id);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    info!("🤖 Bot {} joined room {}", player_id, args.room);

    let mut rng = StdRng::from_entropy();
    let mut bot = Bot::new(player_id, &mut rng);
    let mut report = BotReport::default();

    let mut move_timer = interval(Duration::from_secs_f64(1.0 / args.move_freq.max(0.1)));
    let mut collect_timer = interval(Duration::from_secs_f64(60.0 / args.collect_freq.max(0.1)));
    // Both intervals fire immediately; skip the first collect.
    collect_timer.tick().await;
    let deadline = sleep(Duration::from_secs(args.duration));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!("📨 Bot {} received {}", bot.player_id, text.as_str());
                        report.record(text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("🔌 Server closed the connection of bot {}", bot.player_id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("❌ Bot {} connection error: {}", bot.player_id, e);
                        break;
                    }
                }
            }
            _ = move_timer.tick() => {
                bot.step(&mut rng);
                ws_sender.send(Message::text(bot.update_message().to_string())).await?;
                report.sent += 1;
            }
            _ = collect_timer.tick() => {
                let message = bot.collect_message(&mut rng);
                ws_sender.send(Message::text(message.to_string())).await?;
                report.sent += 1;
                debug!("⭐ Bot {} collected an emoji (score {})", bot.player_id, bot.score);
            }
            _ = &mut deadline => {
                break;
            }
        }
    }

    let _ = ws_sender.send(Message::Close(None)).await;
    info!(
        "👋 Bot {} done: sent {} | received {} | score {}",
        bot.player_id,
        report.sent,
        report.received.values().sum::<u64>(),
        bot.score
    );
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    info!("🚀 Starting Emoji Trail player simulation");
    info!("   • Bots: {}", args.players);
    info!("   • Room: {}", args.room);
    info!("   • Movement: {:.1} Hz", args.move_freq);
    info!("   • Collections: {:.1}/min", args.collect_freq);
    info!("   • Duration: {} seconds", args.duration);
    info!("   • Server: {}", args.url);

    let started = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..args.players {
        let player_id = format!("bot_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        let args = args.clone();
        handles.push(tokio::spawn(async move {
            match simulate_bot(player_id.clone(), args).await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!("❌ Bot {} simulation failed: {}", player_id, e);
                    None
                }
            }
        }));

        // Stagger connections so joins are observable one by one
        sleep(Duration::from_millis(100)).await;
    }

    let mut total = BotReport::default();
    let mut finished = 0;
    for handle in handles {
        if let Ok(Some(report)) = handle.await {
            total.merge(report);
            finished += 1;
        }
    }

    info!("✅ Simulation complete in {:.1}s", started.elapsed().as_secs_f64());
    info!("📋 Summary:");
    info!("   • Bots finished: {}/{}", finished, args.players);
    info!("   • Frames sent: {}", total.sent);
    for (kind, count) in &total.received {
        info!("   • Received {}: {}", kind, count);
    }

    Ok(())
}
