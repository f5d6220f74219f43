//! Tunable constants for physics, obstacles, and sound detection.
//!
//! Everything lives in one immutable [`Config`] handed to the constructors,
//! so tests can run the simulation with overridden values.

/// Simulation, obstacle, and audio tuning. Distances are in simulation
/// units (an 800x600 playfield), speeds are units per tick.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Playfield width.
    pub screen_width: f32,
    /// Playfield height, including the ground strip.
    pub screen_height: f32,
    /// Height of the ground strip at the bottom of the playfield.
    pub ground_height: f32,
    /// Simulation ticks (and rendered frames) per second.
    pub fps: u32,

    /// Downward acceleration per silent tick.
    pub gravity: f32,
    /// Velocity set by the keyboard jump (negative = up).
    pub jump_strength: f32,
    /// Multiplier mapping a normalized level to upward velocity.
    pub upward_gain: f32,
    /// Actor bounding box.
    pub actor_width: f32,
    pub actor_height: f32,
    /// Fixed horizontal position of the actor.
    pub actor_x: f32,

    /// Leftward speed of obstacles at score 0.
    pub base_speed: f32,
    /// Speed added per point scored (applied to new spawns only).
    pub speed_per_point: f32,
    /// Vertical size of the gap in each obstacle.
    pub gap_height: f32,
    /// The gap is placed so it lies fully inside
    /// `[gap_margin, screen_height - ground_height - gap_margin]`.
    pub gap_margin: f32,
    /// Obstacle width.
    pub obstacle_width: f32,
    /// Ticks between spawns; a new obstacle appears when the timer exceeds this.
    pub spawn_interval: u32,

    /// Requested capture sample rate.
    pub sample_rate: u32,
    /// Requested capture buffer size in frames.
    pub chunk_size: u32,
    /// Mean absolute amplitude (i16 scale) below which a tick counts as silence.
    pub sound_threshold: f32,
    /// Full-scale raw volume for the sound-test meter.
    pub meter_max_volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 600.0,
            ground_height: 50.0,
            fps: 60,

            gravity: 0.5,
            jump_strength: -10.0,
            upward_gain: 8.0,
            actor_width: 60.0,
            actor_height: 60.0,
            actor_x: 100.0,

            base_speed: 5.0,
            speed_per_point: 0.1,
            gap_height: 200.0,
            gap_margin: 100.0,
            obstacle_width: 80.0,
            spawn_interval: 100,

            sample_rate: 44100,
            chunk_size: 1024,
            sound_threshold: 300.0,
            meter_max_volume: 3000.0,
        }
    }
}

impl Config {
    /// Y coordinate of the playfield floor (top of the ground strip).
    pub fn floor_y(&self) -> f32 {
        self.screen_height - self.ground_height
    }

    /// Lowest y the actor's top edge can reach before it is grounded.
    pub fn actor_floor(&self) -> f32 {
        self.floor_y() - self.actor_height
    }
}
