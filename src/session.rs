//! Top-level game session: the sound-test / playing / game-over state
//! machine, button hit-regions, and input handling. Input arrives as
//! abstract [`InputEvent`]s in simulation coordinates, so the whole machine
//! runs headless in tests.

use crate::config::Config;
use crate::game::{Rect, TickOutcome, World};

/// Current phase. The sound-test screen gates straight into gameplay on
/// Start; restart likewise goes straight back to Playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SoundTest,
    Playing,
    GameOver,
}

/// One discrete input, already translated to simulation coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Quit,
    MouseDown { x: f32, y: f32 },
    MouseMove { x: f32, y: f32 },
    /// Spacebar: immediate jump, independent of this tick's audio.
    Jump,
    /// Enter: press whichever button the current screen shows.
    Activate,
}

/// Something the frame loop may want to react to (sound cues).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Scored,
    Died,
}

/// A clickable control with a hover state.
#[derive(Debug, Clone)]
pub struct Button {
    pub rect: Rect,
    pub label: &'static str,
    pub hover: bool,
}

impl Button {
    fn new(rect: Rect, label: &'static str) -> Self {
        Self { rect, label, hover: false }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.rect.x
            && x < self.rect.x + self.rect.w
            && y >= self.rect.y
            && y < self.rect.y + self.rect.h
    }
}

pub struct GameSession {
    pub phase: Phase,
    pub world: World,
    pub start_button: Button,
    pub restart_button: Button,
    config: Config,
}

impl GameSession {
    pub fn new(config: Config, seed: u64) -> Self {
        let button_rect = Rect::new(
            config.screen_width / 2.0 - 100.0,
            config.screen_height / 2.0 + 80.0,
            200.0,
            50.0,
        );
        Self {
            phase: Phase::SoundTest,
            world: World::new(config, seed),
            start_button: Button::new(button_rect, "START"),
            restart_button: Button::new(button_rect, "RESTART"),
            config,
        }
    }

    /// Handle one input event. Returns false when the session should end;
    /// quit is honored in every phase.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Quit => return false,
            InputEvent::MouseDown { x, y } => match self.phase {
                Phase::SoundTest if self.start_button.contains(x, y) => self.begin(),
                Phase::GameOver if self.restart_button.contains(x, y) => self.restart(),
                _ => {}
            },
            InputEvent::MouseMove { x, y } => match self.phase {
                Phase::SoundTest => self.start_button.hover = self.start_button.contains(x, y),
                Phase::GameOver => self.restart_button.hover = self.restart_button.contains(x, y),
                Phase::Playing => {}
            },
            InputEvent::Jump => {
                if self.phase == Phase::Playing {
                    self.world.actor.jump(&self.config);
                }
            }
            InputEvent::Activate => match self.phase {
                Phase::SoundTest => self.begin(),
                Phase::GameOver => self.restart(),
                Phase::Playing => {}
            },
        }
        true
    }

    /// Advance the world one tick while playing. The returned event cues a
    /// sound effect; phase changes happen here.
    pub fn update(&mut self, level: f32) -> Option<SessionEvent> {
        if self.phase != Phase::Playing {
            return None;
        }
        let score_before = self.world.score;
        match self.world.tick(level) {
            TickOutcome::Collided => {
                self.phase = Phase::GameOver;
                Some(SessionEvent::Died)
            }
            TickOutcome::Continue if self.world.score > score_before => {
                Some(SessionEvent::Scored)
            }
            TickOutcome::Continue => None,
        }
    }

    /// Whether this tick should touch the microphone at all.
    pub fn wants_audio(&self) -> bool {
        matches!(self.phase, Phase::SoundTest | Phase::Playing)
    }

    fn begin(&mut self) {
        self.phase = Phase::Playing;
    }

    /// Fresh world, straight back into gameplay. Score, obstacles, spawn
    /// timer, and scroll speed all reset with it.
    fn restart(&mut self) {
        self.world = World::new(self.config, rand::random());
        self.restart_button.hover = false;
        self.phase = Phase::Playing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOVER: f32 = 0.05;

    fn session() -> GameSession {
        GameSession::new(Config::default(), 42)
    }

    fn drive_to_game_over(session: &mut GameSession) {
        for _ in 0..1000 {
            if session.update(0.0) == Some(SessionEvent::Died) {
                return;
            }
        }
        panic!("session never reached game over");
    }

    #[test]
    fn starts_in_sound_test() {
        let s = session();
        assert_eq!(s.phase, Phase::SoundTest);
        assert!(s.wants_audio());
    }

    #[test]
    fn start_click_goes_straight_to_playing() {
        let mut s = session();
        let (bx, by) = (s.start_button.rect.x + 1.0, s.start_button.rect.y + 1.0);
        assert!(s.handle_event(InputEvent::MouseDown { x: bx, y: by }));
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn click_outside_start_button_is_ignored() {
        let mut s = session();
        assert!(s.handle_event(InputEvent::MouseDown { x: 5.0, y: 5.0 }));
        assert_eq!(s.phase, Phase::SoundTest);
    }

    #[test]
    fn update_is_a_no_op_outside_playing() {
        let mut s = session();
        let y_before = s.world.actor.y;
        assert_eq!(s.update(0.0), None);
        assert_eq!(s.world.actor.y, y_before);
    }

    #[test]
    fn space_jumps_only_while_playing() {
        let mut s = session();
        s.handle_event(InputEvent::Jump);
        assert_eq!(s.world.actor.velocity, 0.0);

        s.handle_event(InputEvent::Activate);
        s.handle_event(InputEvent::Jump);
        assert_eq!(s.world.actor.velocity, Config::default().jump_strength);
    }

    #[test]
    fn collision_transitions_to_game_over() {
        let mut s = session();
        s.handle_event(InputEvent::Activate);
        drive_to_game_over(&mut s);
        assert_eq!(s.phase, Phase::GameOver);
        assert!(!s.wants_audio());
    }

    #[test]
    fn game_over_freezes_input_except_restart() {
        let mut s = session();
        s.handle_event(InputEvent::Activate);
        drive_to_game_over(&mut s);

        s.handle_event(InputEvent::Jump);
        assert_eq!(s.update(2.0), None);
        assert_eq!(s.phase, Phase::GameOver);
    }

    #[test]
    fn restart_resets_world_and_resumes_playing() {
        let mut s = session();
        s.handle_event(InputEvent::Activate);
        // Rack up a score so the reset is observable.
        s.world.score = 12;
        drive_to_game_over(&mut s);

        let (bx, by) = (s.restart_button.rect.x + 1.0, s.restart_button.rect.y + 1.0);
        s.handle_event(InputEvent::MouseDown { x: bx, y: by });
        assert_eq!(s.phase, Phase::Playing);
        assert_eq!(s.world.score, 0);
        assert!(s.world.obstacles.is_empty());
        assert_eq!(s.world.current_speed, Config::default().base_speed);

        // The first obstacle of the new run comes in at base speed.
        for _ in 0..=Config::default().spawn_interval {
            s.update(HOVER);
        }
        assert_eq!(s.world.obstacles.len(), 1);
        assert_eq!(s.world.obstacles[0].speed, Config::default().base_speed);
    }

    #[test]
    fn quit_is_accepted_in_every_phase() {
        let mut s = session();
        assert!(!s.handle_event(InputEvent::Quit));

        let mut s = session();
        s.handle_event(InputEvent::Activate);
        assert!(!s.handle_event(InputEvent::Quit));

        let mut s = session();
        s.handle_event(InputEvent::Activate);
        drive_to_game_over(&mut s);
        assert!(!s.handle_event(InputEvent::Quit));
    }

    #[test]
    fn hover_tracks_mouse_over_buttons() {
        let mut s = session();
        let (bx, by) = (s.start_button.rect.x + 1.0, s.start_button.rect.y + 1.0);
        s.handle_event(InputEvent::MouseMove { x: bx, y: by });
        assert!(s.start_button.hover);
        s.handle_event(InputEvent::MouseMove { x: 0.0, y: 0.0 });
        assert!(!s.start_button.hover);
    }
}
