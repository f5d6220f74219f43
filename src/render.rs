//! Terminal rendering: a pixel buffer drawn with Unicode half-blocks (two
//! pixels per character cell), a tiny 3x5 bitmap font, and the scene drawing
//! for each phase. The simulation runs in a fixed 800x600 space; drawing
//! scales it onto whatever size the terminal happens to be.

use std::io::{self, Write};

use crossterm::{cursor, queue, style, style::Color as TermColor};

use crate::config::Config;
use crate::game::Rect;
use crate::session::{Button, GameSession, Phase};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }

    fn term(self) -> TermColor {
        TermColor::Rgb { r: self.0, g: self.1, b: self.2 }
    }
}

const BLACK: Rgb = Rgb(0, 0, 0);
const WHITE: Rgb = Rgb(255, 255, 255);
const GRAY: Rgb = Rgb(128, 128, 128);
const DARK: Rgb = Rgb(40, 40, 40);
const RED: Rgb = Rgb(255, 0, 0);
const YELLOW: Rgb = Rgb(255, 255, 0);
const GREEN: Rgb = Rgb(0, 255, 0);

// ── Pixel buffer ────────────────────────────────────────────────────────────

/// Off-screen RGB buffer. Height is terminal rows times two; `present`
/// writes each pixel pair as one `▀` cell, skipping redundant color codes.
pub struct PixelBuf {
    w: usize,
    h: usize,
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self { w, h, px: vec![BLACK; w * h] }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, BLACK);
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    fn clear(&mut self, c: Rgb) {
        self.px.fill(c);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dy in 0..h {
            for dx in 0..w {
                self.set(x + dx, y + dy, c);
            }
        }
    }

    fn outline_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for dx in 0..w {
            self.set(x + dx, y, c);
            self.set(x + dx, y + h - 1, c);
        }
        for dy in 0..h {
            self.set(x, y + dy, c);
            self.set(x + w - 1, y + dy, c);
        }
    }

    fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, c: Rgb) {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.set(cx + dx, cy + dy, c);
                }
            }
        }
    }

    fn dim_all(&mut self) {
        for p in &mut self.px {
            *p = p.dim();
        }
    }

    /// Flush the buffer to the terminal as half-block cells.
    pub fn present(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top == bot {
                    // Uniform cell: a plain space on the background color.
                    if bg != Some(top) {
                        queue!(out, style::SetBackgroundColor(top.term()))?;
                        bg = Some(top);
                    }
                    queue!(out, style::Print(' '))?;
                } else {
                    if fg != Some(top) {
                        queue!(out, style::SetForegroundColor(top.term()))?;
                        fg = Some(top);
                    }
                    if bg != Some(bot) {
                        queue!(out, style::SetBackgroundColor(bot.term()))?;
                        bg = Some(bot);
                    }
                    queue!(out, style::Print('\u{2580}'))?; // ▀
                }
            }
            if row < rows - 1 {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

#[rustfmt::skip]
fn glyph(ch: char) -> Option<[u8; 15]> {
    Some(match ch {
        '0' => [1,1,1, 1,0,1, 1,0,1, 1,0,1, 1,1,1],
        '1' => [0,1,0, 1,1,0, 0,1,0, 0,1,0, 1,1,1],
        '2' => [1,1,1, 0,0,1, 1,1,1, 1,0,0, 1,1,1],
        '3' => [1,1,1, 0,0,1, 0,1,1, 0,0,1, 1,1,1],
        '4' => [1,0,1, 1,0,1, 1,1,1, 0,0,1, 0,0,1],
        '5' => [1,1,1, 1,0,0, 1,1,1, 0,0,1, 1,1,1],
        '6' => [1,1,1, 1,0,0, 1,1,1, 1,0,1, 1,1,1],
        '7' => [1,1,1, 0,0,1, 0,1,0, 0,1,0, 0,1,0],
        '8' => [1,1,1, 1,0,1, 1,1,1, 1,0,1, 1,1,1],
        '9' => [1,1,1, 1,0,1, 1,1,1, 0,0,1, 1,1,1],
        'A' => [0,1,0, 1,0,1, 1,1,1, 1,0,1, 1,0,1],
        'C' => [0,1,1, 1,0,0, 1,0,0, 1,0,0, 0,1,1],
        'E' => [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,1,1],
        'F' => [1,1,1, 1,0,0, 1,1,0, 1,0,0, 1,0,0],
        'G' => [0,1,1, 1,0,0, 1,0,1, 1,0,1, 0,1,1],
        'I' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 1,1,1],
        'L' => [1,0,0, 1,0,0, 1,0,0, 1,0,0, 1,1,1],
        'M' => [1,0,1, 1,1,1, 1,0,1, 1,0,1, 1,0,1],
        'N' => [1,0,1, 1,1,1, 1,1,1, 1,0,1, 1,0,1],
        'O' => [0,1,0, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        'R' => [1,1,0, 1,0,1, 1,1,0, 1,0,1, 1,0,1],
        'S' => [0,1,1, 1,0,0, 0,1,0, 0,0,1, 1,1,0],
        'T' => [1,1,1, 0,1,0, 0,1,0, 0,1,0, 0,1,0],
        'V' => [1,0,1, 1,0,1, 1,0,1, 1,0,1, 0,1,0],
        '/' => [0,0,1, 0,0,1, 0,1,0, 1,0,0, 1,0,0],
        _ => return None,
    })
}

fn draw_char(buf: &mut PixelBuf, x: i32, y: i32, ch: char, scale: i32, c: Rgb) {
    let Some(bits) = glyph(ch) else { return };
    for row in 0..5 {
        for col in 0..3 {
            if bits[(row * 3 + col) as usize] == 1 {
                buf.fill_rect(x + col * scale, y + row * scale, scale, scale, c);
            }
        }
    }
}

fn text_width(text: &str, scale: i32) -> i32 {
    text.len() as i32 * 4 * scale - scale
}

fn draw_text(buf: &mut PixelBuf, x: i32, y: i32, text: &str, scale: i32, c: Rgb) {
    for (i, ch) in text.chars().enumerate() {
        draw_char(buf, x + i as i32 * 4 * scale, y, ch, scale, c);
    }
}

fn draw_text_centered(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, scale: i32, c: Rgb) {
    draw_text(buf, cx - text_width(text, scale) / 2, y, text, scale, c);
}

// ── Scene drawing ───────────────────────────────────────────────────────────

/// Maps the fixed simulation space onto the current pixel buffer.
#[derive(Clone, Copy)]
pub struct Mapper {
    sx: f32,
    sy: f32,
}

impl Mapper {
    pub fn new(buf: &PixelBuf, config: &Config) -> Self {
        Self {
            sx: buf.width() as f32 / config.screen_width,
            sy: buf.height() as f32 / config.screen_height,
        }
    }

    fn x(&self, x: f32) -> i32 {
        (x * self.sx) as i32
    }

    fn y(&self, y: f32) -> i32 {
        (y * self.sy) as i32
    }

    fn rect(&self, r: &Rect) -> (i32, i32, i32, i32) {
        let x0 = self.x(r.x);
        let y0 = self.y(r.y);
        (x0, y0, self.x(r.x + r.w) - x0, self.y(r.y + r.h) - y0)
    }

    /// Terminal cell back to simulation coordinates, for mouse hit-testing.
    pub fn cell_to_sim(&self, col: u16, row: u16) -> (f32, f32) {
        (col as f32 / self.sx, (row as f32 * 2.0 + 1.0) / self.sy)
    }
}

/// Render the whole frame for the current phase.
pub fn draw_frame(buf: &mut PixelBuf, session: &GameSession, raw_volume: f32, available: bool) {
    let config = *session.world.config();
    let map = Mapper::new(buf, &config);
    buf.clear(BLACK);

    match session.phase {
        Phase::SoundTest => {
            draw_sound_test(buf, &map, &config, raw_volume, &session.start_button);
        }
        Phase::Playing => {
            draw_playfield(buf, &map, session, raw_volume, available, &config);
        }
        Phase::GameOver => {
            draw_playfield(buf, &map, session, raw_volume, available, &config);
            draw_game_over(buf, &map, session, &config);
        }
    }
}

fn draw_sound_test(buf: &mut PixelBuf, map: &Mapper, config: &Config, raw: f32, start: &Button) {
    draw_text_centered(buf, map.x(config.screen_width / 2.0), map.y(120.0), "SCREAM", 4, WHITE);

    // Volume meter with the trigger threshold marked on it.
    let (bx, by, bw, bh) = map.rect(&Rect::new(config.screen_width / 2.0 - 200.0, 220.0, 400.0, 40.0));
    let percent = (raw / config.meter_max_volume).min(1.0);
    let color = if percent < 0.3 {
        RED
    } else if percent < 0.6 {
        YELLOW
    } else {
        GREEN
    };
    buf.fill_rect(bx, by, bw, bh, GRAY);
    buf.fill_rect(bx, by, (bw as f32 * percent) as i32, bh, color);
    buf.outline_rect(bx, by, bw, bh, WHITE);
    let marker_x = bx + (bw as f32 * config.sound_threshold / config.meter_max_volume) as i32;
    for dy in -2..bh + 2 {
        buf.set(marker_x, by + dy, WHITE);
    }

    draw_button(buf, map, start);
}

fn draw_playfield(
    buf: &mut PixelBuf,
    map: &Mapper,
    session: &GameSession,
    raw: f32,
    available: bool,
    config: &Config,
) {
    let world = &session.world;

    // Pipes.
    for obstacle in &world.obstacles {
        for region in obstacle.bounding_regions(config) {
            let (x, y, w, h) = map.rect(&region);
            buf.fill_rect(x, y, w, h, WHITE);
        }
    }

    // Ground with a dark divider on top.
    let (gx, gy, gw, gh) = map.rect(&Rect::new(0.0, config.floor_y(), config.screen_width, config.ground_height));
    buf.fill_rect(gx, gy, gw, gh, WHITE);
    buf.fill_rect(gx, gy, gw, (gh / 8).max(1), DARK);

    draw_actor(buf, map, session, config);

    // Score top-right; raw volume below it when the microphone is live.
    let right = buf.width() as i32 - 2;
    let score_text = format!("SCORE {}", world.score);
    draw_text(buf, right - text_width(&score_text, 2), 2, &score_text, 2, WHITE);
    if available {
        let vol_text = format!("VOL {}/{}", raw as i32, config.sound_threshold as i32);
        let color = if raw < config.sound_threshold { YELLOW } else { GREEN };
        draw_text(buf, right - text_width(&vol_text, 1), 14, &vol_text, 1, color);
    }
}

fn draw_actor(buf: &mut PixelBuf, map: &Mapper, session: &GameSession, config: &Config) {
    let actor = &session.world.actor;

    // Shadow on the ground under the character.
    let shadow = Rect::new(actor.x + 10.0, config.floor_y() - 8.0, actor.width - 20.0, 8.0);
    let (sx, sy, sw, sh) = map.rect(&shadow);
    buf.fill_rect(sx, sy, sw, sh, DARK);

    // Procedural character: white disc with two eyes.
    let cx = map.x(actor.x + actor.width / 2.0);
    let cy = map.y(actor.y + actor.height / 2.0);
    let r = (map.x(actor.width / 2.0)).min(map.y(actor.height / 2.0)).max(2);
    buf.fill_circle(cx, cy, r, WHITE);
    let eye_dx = (r / 3).max(1);
    let eye_r = (r / 6).max(1);
    buf.fill_circle(cx - eye_dx, cy - eye_dx, eye_r, BLACK);
    buf.fill_circle(cx + eye_dx, cy - eye_dx, eye_r, BLACK);
}

fn draw_game_over(buf: &mut PixelBuf, map: &Mapper, session: &GameSession, config: &Config) {
    buf.dim_all();
    let cx = map.x(config.screen_width / 2.0);
    draw_text_centered(buf, cx, map.y(config.screen_height / 2.0 - 80.0), "GAME OVER", 3, WHITE);
    let score_text = format!("FINAL SCORE {}", session.world.score);
    draw_text_centered(buf, cx, map.y(config.screen_height / 2.0), &score_text, 2, WHITE);
    draw_button(buf, map, &session.restart_button);
}

fn draw_button(buf: &mut PixelBuf, map: &Mapper, button: &Button) {
    let (x, y, w, h) = map.rect(&button.rect);
    let fill = if button.hover { GRAY } else { WHITE };
    buf.fill_rect(x, y, w, h, fill);
    buf.outline_rect(x, y, w, h, BLACK);
    let (tw, th) = (text_width(button.label, 2), 5 * 2);
    draw_text(buf, x + (w - tw) / 2, y + (h - th) / 2, button.label, 2, BLACK);
}
