//! The card that follows the torus knot while the pointer is over it.
//!
//! On a hit the card is shown at full target opacity and moved to the
//! projected screen position of the object. On a miss the target opacity
//! drops to zero, and 300 ms after the miss began the card is hidden
//! entirely unless a hit brought it back in the meantime. Opacity itself
//! eases linearly towards the target over the same 300 ms.

use glam::Vec2;

use crate::assets::{Assets, FontId};
use crate::draw2d::{Color, Draw2d, Rect};

/// Fade duration and hide delay, in seconds.
pub const FADE_SECONDS: f32 = 0.3;

const PADDING: f32 = 10.0;
const FALLBACK_WIDTH: f32 = 220.0;

#[derive(Clone, Debug)]
pub struct HoverModal {
    pub title: String,
    pub lines: Vec<String>,
    displayed: bool,
    opacity: f32,
    target_opacity: f32,
    position: Vec2,
    since_miss: Option<f32>,
}

impl HoverModal {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
            displayed: false,
            opacity: 0.0,
            target_opacity: 0.0,
            position: Vec2::ZERO,
            since_miss: None,
        }
    }

    /// Advance one frame. `hit` is the screen position of the hovered object,
    /// or `None` when the pointer ray missed it.
    pub fn update(&mut self, hit: Option<Vec2>, dt: f32) {
        let dt = dt.max(0.0);
        match hit {
            Some(position) => {
                self.displayed = true;
                self.target_opacity = 1.0;
                self.position = position;
                self.since_miss = None;
            }
            None => {
                self.target_opacity = 0.0;
                if self.displayed {
                    let waited = self.since_miss.map_or(0.0, |t| t + dt);
                    if waited >= FADE_SECONDS {
                        self.displayed = false;
                        self.since_miss = None;
                    } else {
                        self.since_miss = Some(waited);
                    }
                }
            }
        }

        let step = dt / FADE_SECONDS;
        self.opacity = if self.opacity < self.target_opacity {
            (self.opacity + step).min(self.target_opacity)
        } else {
            (self.opacity - step).max(self.target_opacity)
        };
        if !self.displayed {
            self.opacity = 0.0;
        }
    }

    /// Whether the card takes part in layout at all.
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    /// Opacity the card is currently drawn with.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn target_opacity(&self) -> f32 {
        self.target_opacity
    }

    /// Top-left corner of the card in window pixels.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Card rectangle for the given font, kept inside the window.
    pub fn card_rect(&self, assets: &Assets, font: Option<FontId>, screen: Vec2) -> Rect {
        let (width, line_height) = match font.and_then(|id| assets.font(id)) {
            Some(font) => {
                let widest = std::iter::once(&self.title)
                    .chain(&self.lines)
                    .map(|line| font.measure(line))
                    .fold(0.0, f32::max);
                (widest + PADDING * 2.0, font.line_height())
            }
            None => (FALLBACK_WIDTH, 18.0),
        };
        let height = PADDING * 2.0 + line_height * (1 + self.lines.len()) as f32 + 4.0;

        let x = self.position.x.min(screen.x - width).max(0.0);
        let y = self.position.y.min(screen.y - height).max(0.0);
        Rect::new(x, y, width, height)
    }

    pub fn draw(&self, draw: &mut Draw2d, assets: &Assets, font: Option<FontId>, screen: Vec2) {
        if !self.displayed || self.opacity <= 0.0 {
            return;
        }
        let alpha = self.opacity;
        let rect = self.card_rect(assets, font, screen);

        draw.rect(rect, Color::rgba(0.08, 0.05, 0.16, 0.9 * alpha));
        draw.outline(rect, 1.0, Color::rgba(0.6, 0.4, 1.0, alpha));

        let Some(font_id) = font else {
            return;
        };
        let line_height = assets.font(font_id).map_or(18.0, |f| f.line_height());
        let x = rect.x + PADDING;
        let mut y = rect.y + PADDING;
        draw.text(assets, font_id, x, y, &self.title, Color::WHITE.with_alpha(alpha));
        y += line_height + 4.0;
        for line in &self.lines {
            draw.text(
                assets,
                font_id,
                x,
                y,
                line,
                Color::rgb(0.8, 0.8, 0.85).with_alpha(alpha),
            );
            y += line_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn modal() -> HoverModal {
        HoverModal::new("Torus Knot", vec!["line".into()])
    }

    #[test]
    fn starts_hidden() {
        let mut m = modal();
        m.update(None, FRAME);
        assert!(!m.is_displayed());
        assert_eq!(m.opacity(), 0.0);
    }

    #[test]
    fn hit_shows_and_fades_in() {
        let mut m = modal();
        m.update(Some(Vec2::new(640.0, 360.0)), FRAME);
        assert!(m.is_displayed());
        assert_eq!(m.target_opacity(), 1.0);
        assert_eq!(m.position(), Vec2::new(640.0, 360.0));
        assert!(m.opacity() > 0.0 && m.opacity() < 1.0);

        for _ in 0..30 {
            m.update(Some(Vec2::new(650.0, 360.0)), FRAME);
        }
        assert_eq!(m.opacity(), 1.0);
        assert_eq!(m.position(), Vec2::new(650.0, 360.0));
    }

    #[test]
    fn miss_hides_after_delay() {
        let mut m = modal();
        for _ in 0..30 {
            m.update(Some(Vec2::ZERO), FRAME);
        }

        // 250 ms of misses: fading but still displayed.
        for _ in 0..15 {
            m.update(None, FRAME);
        }
        assert!(m.is_displayed());
        assert_eq!(m.target_opacity(), 0.0);
        assert!(m.opacity() < 0.5);

        for _ in 0..5 {
            m.update(None, FRAME);
        }
        assert!(!m.is_displayed());
        assert_eq!(m.opacity(), 0.0);
    }

    #[test]
    fn hit_during_fade_cancels_hide() {
        let mut m = modal();
        m.update(Some(Vec2::ZERO), FRAME);
        for _ in 0..10 {
            m.update(None, FRAME);
        }
        m.update(Some(Vec2::ONE), FRAME);
        for _ in 0..10 {
            m.update(None, FRAME);
        }
        // Only ~167 ms since the latest miss began.
        assert!(m.is_displayed());
    }

    #[test]
    fn card_stays_on_screen() {
        let mut m = modal();
        m.update(Some(Vec2::new(1270.0, 710.0)), FRAME);
        let rect = m.card_rect(&Assets::new(), None, Vec2::new(1280.0, 720.0));
        assert!(rect.right() <= 1280.0);
        assert!(rect.bottom() <= 720.0);
    }
}
