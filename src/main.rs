//! Scream: a side-scrolling jumping game controlled by your voice.
//!
//! Yell to rise, stay quiet to fall, dodge the pipes. Runs in the terminal
//! with half-block pixel graphics. `scream --mic-test` runs a standalone
//! microphone diagnostic instead of the game.

mod audio;
mod config;
mod game;
mod render;
mod session;
mod sfx;

use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    style::Stylize,
    terminal,
};

use crate::audio::LevelSource;
use crate::config::Config;
use crate::render::{Mapper, PixelBuf, draw_frame};
use crate::session::{GameSession, InputEvent, SessionEvent};

#[derive(Parser)]
#[command(version, about = "Voice-controlled jumping game. Scream to fly.")]
struct Args {
    /// Run the standalone microphone diagnostic instead of the game
    #[arg(long)]
    mic_test: bool,
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::default();

    if args.mic_test {
        run_mic_test(&config)
    } else {
        run_game(&config)
    }
}

// ── Game loop ───────────────────────────────────────────────────────────────

fn run_game(config: &Config) -> io::Result<()> {
    let mut source = audio::open(config);

    // Sound effects are optional: no output device, no jingles.
    let speaker = rodio::OutputStreamBuilder::open_default_stream().ok();

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )?;

    let cleanup = |out: &mut io::Stdout| -> io::Result<()> {
        execute!(
            out,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        )?;
        terminal::disable_raw_mode()
    };

    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::new(cols as usize, rows as usize * 2);
    let mut session = GameSession::new(*config, rand::random());

    let frame_dur = Duration::from_millis(1000 / config.fps.max(1) as u64);

    loop {
        let frame_start = Instant::now();
        let map = Mapper::new(&buf, config);

        // Input
        while event::poll(Duration::ZERO)? {
            let input = match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        Some(InputEvent::Quit)
                    }
                    KeyCode::Char(' ') => Some(InputEvent::Jump),
                    KeyCode::Enter => Some(InputEvent::Activate),
                    _ => None,
                },
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    let (x, y) = map.cell_to_sim(column, row);
                    Some(InputEvent::MouseDown { x, y })
                }
                Event::Mouse(MouseEvent { kind: MouseEventKind::Moved, column, row, .. }) => {
                    let (x, y) = map.cell_to_sim(column, row);
                    Some(InputEvent::MouseMove { x, y })
                }
                Event::Resize(c, r) => {
                    buf.resize(c as usize, r as usize * 2);
                    None
                }
                _ => None,
            };
            if let Some(input) = input {
                if !session.handle_event(input) {
                    // Release the microphone before the terminal goes back.
                    source.close();
                    return cleanup(&mut out);
                }
            }
        }

        // Update: one audio poll per tick, only in phases that listen.
        let level = if session.wants_audio() { source.poll() } else { 0.0 };
        match session.update(level) {
            Some(SessionEvent::Scored) => {
                if let Some(speaker) = &speaker {
                    sfx::play_score(speaker.mixer());
                }
            }
            Some(SessionEvent::Died) => {
                if let Some(speaker) = &speaker {
                    sfx::play_death(speaker.mixer());
                }
            }
            None => {}
        }

        // Render
        draw_frame(&mut buf, &session, source.last_raw_volume(), source.is_available());
        buf.present(&mut out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

// ── Microphone diagnostic ───────────────────────────────────────────────────

fn run_mic_test(config: &Config) -> io::Result<()> {
    println!("Initializing microphone...");
    let mut source = audio::open(config);
    if !source.is_available() {
        println!("No microphone available.");
        println!("Check that a capture device is connected, permitted, and not in use.");
        return Ok(());
    }
    println!("Microphone initialized. Speak and watch the volume value.\n");

    let mut out = stdout();
    let threshold = config.sound_threshold as i32;
    for _ in 0..200 {
        source.poll();
        let raw = source.last_raw_volume() as i32;
        let status = if raw > threshold {
            "TRIGGERED!".green()
        } else {
            "quiet".dark_grey()
        };
        print!("\rVolume: {raw:5} / {threshold} {status}    ");
        out.flush()?;
        std::thread::sleep(Duration::from_millis(50));
    }

    println!("\n\nTest complete.");
    println!("- Volume stuck at 0: check microphone permissions.");
    println!("- Volume very low (under 100): move closer to the microphone.");
    println!("- Volume looks fine but never triggers: lower the threshold.");
    println!("- Saw TRIGGERED!: the microphone works.");
    source.close();
    Ok(())
}
