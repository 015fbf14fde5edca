//! Element Clash entry point
//!
//! Headless demo: plays one seeded match with a scripted player (random
//! free swaps, fire whatever slot is full) against the AI and logs the
//! result. Run with `RUST_LOG=info` (or `debug` for every cast and hit).

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::path::Path;
    use std::sync::Arc;

    use element_clash::consts::SLOTS;
    use element_clash::{Battle, Catalog, FireParams, PlayerProfile, Settings};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Simulated frame interval, seconds
    const FRAME_SECS: f64 = 1.0 / 60.0;
    /// Give up after this much simulated time
    const TIME_LIMIT_SECS: f64 = 300.0;
    /// Frames between scripted swaps
    const SWAP_EVERY: u32 = 20;

    env_logger::init();
    log::info!("Element Clash (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0xC1A5);
    let settings = match args.next() {
        Some(path) => Settings::load(Path::new(&path))?,
        None => Settings::load_or_default(Path::new("settings.json")),
    };

    let catalog = Arc::new(Catalog::builtin()?);
    let mut profile = PlayerProfile::new();
    for (slot, id) in ["emberling", "tidepup", "dewdrop", "sparkit"].iter().enumerate() {
        profile.add_owned(id);
        profile.set_phase(id, 2);
        profile.set_slot(slot, Some(id));
    }

    let mut battle = Battle::new(catalog, profile, settings, seed);
    let mut input_rng = Pcg32::seed_from_u64(seed.wrapping_add(1));

    let mut now = 0.0;
    let mut frame = 0u32;
    battle.start(now);
    while !battle.state().is_over() && now < TIME_LIMIT_SECS {
        now += FRAME_SECS;
        frame += 1;

        if frame % SWAP_EVERY == 0 {
            let board = battle.board();
            let (w, h) = (board.w, board.h);
            let a = (input_rng.random_range(0..w), input_rng.random_range(0..h));
            let b = if input_rng.random_bool(0.5) && a.0 + 1 < w {
                (a.0 + 1, a.1)
            } else if a.1 + 1 < h {
                (a.0, a.1 + 1)
            } else {
                (a.0.saturating_sub(1), a.1)
            };
            let resolved = battle.swap(a, b);
            if resolved.total_cleared > 0 {
                log::debug!("swap {:?}<->{:?} cleared {}", a, b, resolved.total_cleared);
            }
        }

        let caps = battle.player_caps();
        for slot in 0..SLOTS {
            if caps[slot] > 0.0 && battle.state().energy[slot] >= caps[slot] {
                if let Some(cast) = battle.fire_slot(slot, FireParams::default()) {
                    log::info!("player cast {} at level {}", cast.creature_id, cast.level);
                }
            }
        }

        battle.frame(now);
    }

    let state = battle.state();
    match state.result {
        Some(result) => log::info!(
            "Finished after {:.1}s ({} ticks): {:?}, player {} / enemy {}, elo {:+}",
            state.now_ms / 1000.0,
            state.tick,
            result.outcome,
            state.player.hp,
            state.enemy.hp,
            result.elo_delta
        ),
        None => log::info!(
            "Time limit reached: player {} / enemy {}",
            state.player.hp,
            state.enemy.hp
        ),
    }
    println!("{}", serde_json::to_string_pretty(&state.result)?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is embedded by a host; there is no standalone web entry point
}
