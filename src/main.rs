//! Actor Collision stress runner
//!
//! Spawns a seeded crowd of moving actors in a walled arena and drives both
//! strategies side by side, checking that they agree every frame.
//!
//! Usage: `actor-collision [actors] [frames] [seed]`

use std::time::{Duration, Instant};

use actor_collision::{Body, CollisionKind, CollisionSettings, CollisionStrategy, create_resolver};

/// Arena size in world units
const ARENA: f32 = 2000.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let actors: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(500);
    let frames: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(300);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(12345);

    log::info!("Actor Collision stress run: {actors} actors, {frames} frames, seed {seed}");

    let settings = CollisionSettings::load("collision_settings.json");
    let scene = spawn_scene(actors, seed);

    let mut naive_scene = scene.clone();
    let mut tree_scene = scene;
    let mut naive = create_resolver::<Body>(&CollisionSettings {
        strategy: CollisionStrategy::Naive,
        ..settings.clone()
    });
    let mut tree = create_resolver::<Body>(&CollisionSettings {
        strategy: CollisionStrategy::DynamicAabbTree,
        ..settings
    });

    for body in &naive_scene {
        if let Err(err) = naive.register(body) {
            log::error!("naive register failed: {err}");
        }
    }
    for body in &tree_scene {
        if let Err(err) = tree.register(body) {
            log::error!("tree register failed: {err}");
        }
    }

    let mut naive_time = Duration::ZERO;
    let mut tree_time = Duration::ZERO;
    let mut total_pairs = 0usize;
    let mut total_reinserts = 0usize;
    let mut mismatches = 0u32;

    for frame in 0..frames {
        step_scene(&mut naive_scene);
        step_scene(&mut tree_scene);

        let start = Instant::now();
        naive.update(&naive_scene);
        let naive_pairs = naive.evaluate(&mut naive_scene);
        naive_time += start.elapsed();

        let start = Instant::now();
        total_reinserts += tree.update(&tree_scene);
        let tree_pairs = tree.evaluate(&mut tree_scene);
        tree_time += start.elapsed();

        total_pairs += tree_pairs.len();
        if naive_pairs != tree_pairs || naive_scene != tree_scene {
            mismatches += 1;
            log::warn!(
                "frame {frame}: naive found {} pairs, tree found {}",
                naive_pairs.len(),
                tree_pairs.len()
            );
        }
    }

    println!("\n{actors} actors x {frames} frames");
    println!("  naive: {:>10.3} ms", naive_time.as_secs_f64() * 1000.0);
    println!("  tree:  {:>10.3} ms", tree_time.as_secs_f64() * 1000.0);
    println!("  pairs: {total_pairs}, tree re-inserts: {total_reinserts}");
    if mismatches == 0 {
        println!("✓ Strategies agree on every frame");
    } else {
        println!("✗ Strategies disagreed on {mismatches} frames");
        std::process::exit(1);
    }
}

/// Mostly active movers, with some walls, sensors and ghosts mixed in
fn spawn_scene(actors: u32, seed: u64) -> Vec<Body> {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    let mut rng = Pcg32::seed_from_u64(seed);
    (0..actors)
        .map(|id| {
            let size = rng.random_range(4.0..24.0);
            let body = Body::new(
                id,
                rng.random_range(0.0..ARENA),
                rng.random_range(0.0..ARENA),
                size,
                size,
            );
            match rng.random_range(0..10) {
                0 => body.with_kind(CollisionKind::Fixed),
                1 => body
                    .with_kind(CollisionKind::Passive)
                    .with_vel(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0)),
                2 => body.with_kind(CollisionKind::PreventCollision),
                3 => body
                    .with_kind(CollisionKind::Elastic)
                    .with_vel(rng.random_range(-6.0..6.0), rng.random_range(-6.0..6.0)),
                _ => body.with_vel(rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0)),
            }
        })
        .collect()
}

/// Integrate velocity and bounce off the arena walls
fn step_scene(scene: &mut [Body]) {
    for body in scene.iter_mut() {
        body.step();
        if body.pos.x < 0.0 || body.pos.x + body.size.x > ARENA {
            body.vel.x = -body.vel.x;
        }
        if body.pos.y < 0.0 || body.pos.y + body.size.y > ARENA {
            body.vel.y = -body.vel.y;
        }
    }
}
