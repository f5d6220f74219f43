//! Core simulation: the actor, scrolling obstacles, and the per-tick world
//! update. Everything here is deterministic given a [`Config`] and a seed.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::Config;

/// Axis-aligned box in simulation coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// Result of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Collided,
}

// ── Actor ───────────────────────────────────────────────────────────────────

/// The player character. Horizontal position is fixed; vertical motion is
/// driven by the normalized audio level (or the keyboard jump).
#[derive(Debug, Clone)]
pub struct Actor {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
    pub alive: bool,
}

impl Actor {
    pub fn new(config: &Config) -> Self {
        Self {
            x: config.actor_x,
            y: config.screen_height / 2.0,
            velocity: 0.0,
            width: config.actor_width,
            height: config.actor_height,
            alive: true,
        }
    }

    /// Advance one tick. A positive level overwrites the velocity with an
    /// upward impulse proportional to it; silence accumulates gravity.
    /// Touching the ceiling zeroes the velocity, touching the ground kills.
    pub fn integrate(&mut self, level: f32, config: &Config) {
        if level > 0.0 {
            self.velocity = -level * config.upward_gain;
        } else {
            self.velocity += config.gravity;
        }
        self.y += self.velocity;

        if self.y < 0.0 {
            self.y = 0.0;
            self.velocity = 0.0;
        }
        if self.y > config.actor_floor() {
            self.y = config.actor_floor();
            self.alive = false;
        }
    }

    /// Manual override: fixed upward impulse, for when no microphone is
    /// available or the player prefers the spacebar.
    pub fn jump(&mut self, config: &Config) {
        self.velocity = config.jump_strength;
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Obstacle ────────────────────────────────────────────────────────────────

/// A pipe pair scrolling right to left. The speed is captured at spawn time:
/// obstacles already on screen keep their pace while newer ones come in
/// faster as the score climbs.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub x: f32,
    pub gap_y: f32,
    pub gap_height: f32,
    pub width: f32,
    pub speed: f32,
    passed: bool,
}

impl Obstacle {
    pub fn new(x: f32, gap_y: f32, speed: f32, config: &Config) -> Self {
        Self {
            x,
            gap_y,
            gap_height: config.gap_height,
            width: config.obstacle_width,
            speed,
            passed: false,
        }
    }

    pub fn advance(&mut self) {
        self.x -= self.speed;
    }

    /// The solid regions: above the gap, and below it down to the floor.
    pub fn bounding_regions(&self, config: &Config) -> [Rect; 2] {
        let below_y = self.gap_y + self.gap_height;
        [
            Rect::new(self.x, 0.0, self.width, self.gap_y),
            Rect::new(self.x, below_y, self.width, config.floor_y() - below_y),
        ]
    }

    pub fn intersects(&self, actor_box: &Rect, config: &Config) -> bool {
        self.bounding_regions(config)
            .iter()
            .any(|r| r.overlaps(actor_box))
    }

    /// True exactly once: the first tick the trailing edge is left of the
    /// actor. Marks the obstacle as counted.
    pub fn try_score(&mut self, actor_x: f32) -> bool {
        if !self.passed && self.x + self.width < actor_x {
            self.passed = true;
            true
        } else {
            false
        }
    }

    /// Fully scrolled off the left edge of the playfield.
    pub fn off_screen(&self) -> bool {
        self.x + self.width <= 0.0
    }
}

// ── World ───────────────────────────────────────────────────────────────────

/// Owns the actor, the obstacles in spawn order, the score, and the spawn
/// timer. One [`World::tick`] per rendered frame.
#[derive(Debug)]
pub struct World {
    pub actor: Actor,
    pub obstacles: Vec<Obstacle>,
    pub score: u32,
    pub current_speed: f32,
    pub game_over: bool,
    spawn_timer: u32,
    config: Config,
    rng: Pcg32,
}

impl World {
    pub fn new(config: Config, seed: u64) -> Self {
        Self {
            actor: Actor::new(&config),
            obstacles: Vec::new(),
            score: 0,
            current_speed: config.base_speed,
            game_over: false,
            spawn_timer: 0,
            config,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Advance the simulation one tick, driven by the normalized audio level.
    pub fn tick(&mut self, level: f32) -> TickOutcome {
        self.current_speed = self.config.base_speed + self.config.speed_per_point * self.score as f32;

        self.actor.integrate(level, &self.config);
        if !self.actor.alive {
            self.game_over = true;
            return TickOutcome::Collided;
        }

        let actor_box = self.actor.bounding_box();
        for obstacle in &mut self.obstacles {
            obstacle.advance();
            if obstacle.intersects(&actor_box, &self.config) {
                self.game_over = true;
                return TickOutcome::Collided;
            }
            if obstacle.try_score(self.actor.x) {
                self.score += 1;
            }
        }

        self.obstacles.retain(|o| !o.off_screen());

        self.spawn_timer += 1;
        if self.spawn_timer > self.config.spawn_interval {
            let obstacle = self.spawn_obstacle();
            self.obstacles.push(obstacle);
            self.spawn_timer = 0;
        }

        TickOutcome::Continue
    }

    /// New obstacle at the right edge, carrying the current scroll speed.
    /// Gap placement is the only randomness in the game: uniform over the
    /// band that keeps the whole gap `gap_margin` away from the ceiling and
    /// the ground.
    fn spawn_obstacle(&mut self) -> Obstacle {
        let lo = self.config.gap_margin;
        let hi = self.config.floor_y() - self.config.gap_margin - self.config.gap_height;
        let gap_y = self.rng.random_range(lo..hi);
        Obstacle::new(self.config.screen_width, gap_y, self.current_speed, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::default()
    }

    /// Test config that never spawns, so obstacle lists stay predictable.
    fn cfg_no_spawn() -> Config {
        Config {
            spawn_interval: 1_000_000,
            ..Config::default()
        }
    }

    /// A gentle hum: enough lift to keep the actor airborne forever.
    const HOVER: f32 = 0.05;

    #[test]
    fn silence_accumulates_gravity() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        let mut last = actor.velocity;
        for _ in 0..10 {
            actor.integrate(0.0, &config);
            assert_eq!(actor.velocity, last + config.gravity);
            last = actor.velocity;
        }
    }

    #[test]
    fn loud_tick_overwrites_velocity() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        actor.velocity = 7.0;
        actor.integrate(1.5, &config);
        assert_eq!(actor.velocity, -12.0);
    }

    #[test]
    fn reference_level_sequence_trajectory() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        actor.y = 300.0;

        let levels = [0.0, 0.0, 0.0, 2.0, 0.0];
        let expected_v = [0.5, 1.0, 1.5, -16.0, -15.5];
        let expected_y = [300.5, 301.5, 303.0, 287.0, 271.5];
        for i in 0..levels.len() {
            actor.integrate(levels[i], &config);
            assert_eq!(actor.velocity, expected_v[i], "velocity at tick {i}");
            assert_eq!(actor.y, expected_y[i], "y at tick {i}");
        }
    }

    #[test]
    fn ceiling_clamp_zeroes_velocity() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        actor.y = 3.0;
        actor.integrate(2.0, &config); // v = -16, would overshoot the top
        assert_eq!(actor.y, 0.0);
        assert_eq!(actor.velocity, 0.0);
        assert!(actor.alive);
    }

    #[test]
    fn ground_clamp_kills() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        actor.y = config.actor_floor() - 0.1;
        actor.velocity = 5.0;
        actor.integrate(0.0, &config);
        assert_eq!(actor.y, config.actor_floor());
        assert!(!actor.alive);
    }

    #[test]
    fn actor_stays_inside_bounds() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        // Alternate screaming and silence; y must never leave the playfield.
        for i in 0..500 {
            let level = if i % 7 < 3 { 2.0 } else { 0.0 };
            actor.integrate(level, &config);
            assert!(actor.y >= 0.0);
            assert!(actor.y <= config.actor_floor());
        }
    }

    #[test]
    fn jump_sets_fixed_impulse() {
        let config = cfg();
        let mut actor = Actor::new(&config);
        actor.velocity = 4.0;
        actor.jump(&config);
        assert_eq!(actor.velocity, config.jump_strength);
    }

    #[test]
    fn obstacle_travel_and_removal_edge() {
        let config = cfg();
        let mut obstacle = Obstacle::new(800.0, 200.0, 5.0, &config);
        for _ in 0..160 {
            obstacle.advance();
        }
        assert_eq!(obstacle.x, 0.0);
        // Trailing edge still on screen; not removable yet.
        assert!(!obstacle.off_screen());
        for _ in 0..15 {
            obstacle.advance();
            assert!(!obstacle.off_screen());
        }
        obstacle.advance(); // x = -80, trailing edge at 0
        assert!(obstacle.off_screen());
    }

    #[test]
    fn bounding_regions_span_gap() {
        let config = cfg();
        let obstacle = Obstacle::new(400.0, 150.0, 5.0, &config);
        let [top, bottom] = obstacle.bounding_regions(&config);
        assert_eq!(top, Rect::new(400.0, 0.0, 80.0, 150.0));
        assert_eq!(bottom, Rect::new(400.0, 350.0, 80.0, config.floor_y() - 350.0));

        // A box inside the gap touches neither region.
        let inside = Rect::new(410.0, 200.0, 60.0, 60.0);
        assert!(!obstacle.intersects(&inside, &config));
        // A box above the gap hits the top region.
        let above = Rect::new(410.0, 50.0, 60.0, 60.0);
        assert!(obstacle.intersects(&above, &config));
    }

    #[test]
    fn score_counted_exactly_once() {
        let config = cfg_no_spawn();
        let mut world = World::new(config, 1);
        // Gap covers the actor's hover band so only scoring is in play.
        world.obstacles.push(Obstacle::new(150.0, 250.0, 5.0, &config));

        let mut increments = 0;
        let mut first_scored_tick = None;
        for tick in 1..=40 {
            let before = world.score;
            assert_eq!(world.tick(HOVER), TickOutcome::Continue);
            if world.score > before {
                increments += 1;
                first_scored_tick.get_or_insert(tick);
            }
        }
        assert_eq!(increments, 1);
        // Trailing edge (x + 80) first drops below actor_x = 100 at x = 15,
        // i.e. on the 27th advance.
        assert_eq!(first_scored_tick, Some(27));
        assert_eq!(world.score, 1);
    }

    #[test]
    fn obstacle_removed_when_trailing_edge_reaches_zero() {
        let config = cfg_no_spawn();
        let mut world = World::new(config, 1);
        // Already left of the actor: scores immediately, never collides.
        world.obstacles.push(Obstacle::new(10.0, 250.0, 5.0, &config));

        for tick in 1..=17 {
            world.tick(HOVER);
            assert_eq!(world.obstacles.len(), 1, "still on screen at tick {tick}");
        }
        world.tick(HOVER); // x = -80
        assert!(world.obstacles.is_empty());
        assert_eq!(world.score, 1);
    }

    #[test]
    fn collision_with_pipe_ends_tick() {
        let config = cfg_no_spawn();
        let mut world = World::new(config, 1);
        // Gap far below the actor; the pipe reaches it within a few ticks.
        world.obstacles.push(Obstacle::new(170.0, 350.0, 5.0, &config));

        let mut outcome = TickOutcome::Continue;
        for _ in 0..10 {
            outcome = world.tick(HOVER);
            if outcome == TickOutcome::Collided {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Collided);
        assert!(world.game_over);
    }

    #[test]
    fn ground_fall_is_a_collision() {
        let config = cfg_no_spawn();
        let mut world = World::new(config, 1);
        let mut ticks = 0;
        loop {
            ticks += 1;
            if world.tick(0.0) == TickOutcome::Collided {
                break;
            }
            assert!(ticks < 1000, "actor never hit the ground");
        }
        assert!(!world.actor.alive);
        assert!(world.game_over);
    }

    #[test]
    fn spawn_after_interval_at_current_speed() {
        let config = cfg();
        let mut world = World::new(config, 7);
        for _ in 0..config.spawn_interval {
            world.tick(HOVER);
            assert!(world.obstacles.is_empty());
        }
        world.tick(HOVER);
        assert_eq!(world.obstacles.len(), 1);
        let first = &world.obstacles[0];
        assert_eq!(first.x, config.screen_width);
        assert_eq!(first.speed, config.base_speed);
        // Gap fully inside the safe band.
        assert!(first.gap_y >= config.gap_margin);
        assert!(first.gap_y + first.gap_height <= config.floor_y() - config.gap_margin);
    }

    #[test]
    fn new_obstacles_speed_up_while_old_keep_pace() {
        let config = cfg();
        let mut world = World::new(config, 7);
        world.score = 10;
        for _ in 0..=config.spawn_interval {
            world.tick(HOVER);
        }
        assert_eq!(world.obstacles.len(), 1);
        assert_eq!(world.obstacles[0].speed, 6.0);
        assert_eq!(world.current_speed, 6.0);

        // Earlier obstacles are unaffected by later scoring.
        world.score = 20;
        world.tick(HOVER);
        assert_eq!(world.obstacles[0].speed, 6.0);
        assert_eq!(world.current_speed, 7.0);
    }

    #[test]
    fn gap_band_respected_across_seeds() {
        let config = cfg();
        for seed in 0..20 {
            let mut world = World::new(config, seed);
            for _ in 0..=config.spawn_interval {
                world.tick(HOVER);
            }
            let gap_y = world.obstacles[0].gap_y;
            assert!(gap_y >= config.gap_margin);
            assert!(gap_y + config.gap_height <= config.floor_y() - config.gap_margin);
        }
    }
}
