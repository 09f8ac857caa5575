//! The parameter panel.
//!
//! A column of controllers anchored to the top-right corner, some of them
//! grouped into collapsible folders. Each controller is bound to one scene
//! option; editing it produces an [`OptionChange`] that the caller applies
//! to whatever the option drives.
//!
//! Controllers come in three kinds:
//!
//! - **Color**: a swatch with the hex value. Clicking it expands hue,
//!   saturation and value sliders underneath.
//! - **Toggle**: a checkbox.
//! - **Slider**: a bar over a closed `min..=max` range; values are clamped.
//!
//! The panel reads input through [`PanelInput`] so it can be driven without
//! a window. Pressing H hides or shows it.

use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::assets::{Assets, FontId};
use crate::draw2d::{Color, Draw2d, Rect};
use crate::input::Input;
use crate::options::{NumericOption, OptionChange, SceneOptions};

pub const PANEL_WIDTH: f32 = 260.0;
pub const ROW_HEIGHT: f32 = 24.0;
const LABEL_FRACTION: f32 = 0.4;
const VALUE_WIDTH: f32 = 52.0;
const PAD: f32 = 6.0;
const INDENT: f32 = 10.0;

const ROW_BG: Color = Color::rgba(0.12, 0.12, 0.12, 0.92);
const HEADER_BG: Color = Color::rgba(0.07, 0.07, 0.07, 0.95);
const TRACK: Color = Color::rgb(0.2, 0.2, 0.2);
const FILL: Color = Color::rgb(0.18, 0.63, 0.95);
const TEXT: Color = Color::rgb(0.92, 0.92, 0.92);
const MUTED: Color = Color::rgb(0.6, 0.6, 0.6);

/// What a controller edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    SphereColor,
    Wireframe,
    Numeric(NumericOption),
}

/// One of the three HSV channels of an expanded color controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Hue,
    Saturation,
    Value,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Hue, Channel::Saturation, Channel::Value];

    pub fn range(self) -> (f32, f32) {
        match self {
            Channel::Hue => (0.0, 360.0),
            Channel::Saturation | Channel::Value => (0.0, 1.0),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Channel::Hue => "hue",
            Channel::Saturation => "saturation",
            Channel::Value => "value",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControllerKind {
    /// `hsv` is kept next to `value` so hue survives grey and black.
    Color {
        value: Color,
        hsv: (f32, f32, f32),
        expanded: bool,
    },
    Toggle {
        value: bool,
    },
    Slider {
        min: f32,
        max: f32,
        value: f32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Controller {
    pub label: String,
    pub binding: Binding,
    pub kind: ControllerKind,
}

impl Controller {
    pub fn color(label: &str, binding: Binding, value: Color) -> Self {
        Self {
            label: label.to_string(),
            binding,
            kind: ControllerKind::Color {
                value,
                hsv: value.to_hsv(),
                expanded: false,
            },
        }
    }

    pub fn toggle(label: &str, binding: Binding, value: bool) -> Self {
        Self {
            label: label.to_string(),
            binding,
            kind: ControllerKind::Toggle { value },
        }
    }

    pub fn slider(option: NumericOption, value: f32) -> Self {
        let (min, max) = option.range();
        Self {
            label: option.label().to_string(),
            binding: Binding::Numeric(option),
            kind: ControllerKind::Slider {
                min,
                max,
                value: option.clamp(value),
            },
        }
    }

    /// The change describing this controller's current value.
    pub fn change(&self) -> Option<OptionChange> {
        match (self.binding, &self.kind) {
            (Binding::SphereColor, ControllerKind::Color { value, .. }) => {
                Some(OptionChange::SphereColor(*value))
            }
            (Binding::Wireframe, ControllerKind::Toggle { value }) => {
                Some(OptionChange::Wireframe(*value))
            }
            (Binding::Numeric(option), ControllerKind::Slider { value, .. }) => {
                Some(OptionChange::Numeric(option, *value))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    pub title: String,
    pub open: bool,
    pub controllers: Vec<Controller>,
}

impl Folder {
    pub fn new(title: &str, controllers: Vec<Controller>) -> Self {
        Self {
            title: title.to_string(),
            open: true,
            controllers,
        }
    }
}

/// Address of a controller: root list or a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub folder: Option<usize>,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    Title,
    FolderHeader(usize),
    Controller(Slot),
    ColorChannel(Slot, Channel),
}

/// A laid-out panel row in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Row {
    pub rect: Rect,
    pub kind: RowKind,
    pub indent: f32,
}

impl Row {
    /// Bar area of slider and channel rows.
    pub fn track(&self) -> Rect {
        let inner_x = self.rect.x + self.indent;
        let inner_width = self.rect.width - self.indent;
        let label_width = inner_width * LABEL_FRACTION;
        Rect::new(
            inner_x + label_width,
            self.rect.y + 5.0,
            (inner_width - label_width - VALUE_WIDTH - PAD).max(1.0),
            self.rect.height - 10.0,
        )
    }
}

/// Map a pointer x onto `min..=max` along `track`.
pub fn slider_value(track: Rect, x: f32, min: f32, max: f32) -> f32 {
    let t = ((x - track.x) / track.width).clamp(0.0, 1.0);
    min + t * (max - min)
}

/// Position of `value` along `min..=max`, in `[0, 1]`.
pub fn slider_fraction(value: f32, min: f32, max: f32) -> f32 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Display precision that suits a range's size.
pub fn format_value(value: f32, min: f32, max: f32) -> String {
    let span = max - min;
    if span <= 0.1 {
        format!("{value:.3}")
    } else if span <= 5.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.1}")
    }
}

/// Pointer and key state the panel reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanelInput {
    pub pointer: Option<Vec2>,
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
    pub toggle_visibility: bool,
}

impl PanelInput {
    pub fn from_input(input: &Input) -> Self {
        Self {
            pointer: input.cursor_inside().then(|| input.mouse_position()),
            pressed: input.mouse_pressed(MouseButton::Left),
            down: input.mouse_down(MouseButton::Left),
            released: input.mouse_released(MouseButton::Left),
            toggle_visibility: input.key_pressed(KeyCode::KeyH),
        }
    }
}

struct RowStack {
    x: f32,
    rows: Vec<Row>,
}

impl RowStack {
    fn push(&mut self, kind: RowKind, indent: f32) {
        let y = self.rows.len() as f32 * ROW_HEIGHT;
        self.rows.push(Row {
            rect: Rect::new(self.x, y, PANEL_WIDTH, ROW_HEIGHT),
            kind,
            indent,
        });
    }

    fn controllers(&mut self, list: &[Controller], folder: Option<usize>, indent: f32) {
        for (index, controller) in list.iter().enumerate() {
            let slot = Slot { folder, index };
            self.push(RowKind::Controller(slot), indent);
            if let ControllerKind::Color { expanded: true, .. } = controller.kind {
                for channel in Channel::ALL {
                    self.push(RowKind::ColorChannel(slot, channel), indent + INDENT);
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Slider(Slot),
    Channel(Slot, Channel),
}

pub struct Panel {
    pub title: String,
    pub controllers: Vec<Controller>,
    pub folders: Vec<Folder>,
    visible: bool,
    collapsed: bool,
    drag: Option<Drag>,
    hovered: bool,
}

impl Panel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            controllers: Vec::new(),
            folders: Vec::new(),
            visible: true,
            collapsed: false,
            drag: None,
            hovered: false,
        }
    }

    /// The scene's panel: sphere color, wireframe and speed at the root,
    /// then Spotlight and Bloom folders.
    pub fn for_options(options: &SceneOptions) -> Self {
        let mut panel = Self::new("Controls");
        panel.controllers = vec![
            Controller::color("sphereColor", Binding::SphereColor, options.sphere_color()),
            Controller::toggle("wireframe", Binding::Wireframe, options.wireframe),
            Controller::slider(NumericOption::Speed, options.speed),
        ];
        let sliders = |list: &[NumericOption]| {
            list.iter()
                .map(|&option| Controller::slider(option, options.get(option)))
                .collect()
        };
        panel.folders = vec![
            Folder::new(
                "Spotlight",
                sliders(&[
                    NumericOption::Angle,
                    NumericOption::Penumbra,
                    NumericOption::Intensity,
                ]),
            ),
            Folder::new(
                "Bloom",
                sliders(&[
                    NumericOption::BloomThreshold,
                    NumericOption::BloomStrength,
                    NumericOption::BloomRadius,
                ]),
            ),
        ];
        panel
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.drag = None;
            self.hovered = false;
        }
    }

    /// Whether the pointer belongs to the panel this frame, so orbiting and
    /// picking should ignore it.
    pub fn captures_pointer(&self) -> bool {
        self.visible && (self.hovered || self.drag.is_some())
    }

    pub fn controller(&self, slot: Slot) -> Option<&Controller> {
        match slot.folder {
            None => self.controllers.get(slot.index),
            Some(f) => self.folders.get(f)?.controllers.get(slot.index),
        }
    }

    fn controller_mut(&mut self, slot: Slot) -> Option<&mut Controller> {
        match slot.folder {
            None => self.controllers.get_mut(slot.index),
            Some(f) => self.folders.get_mut(f)?.controllers.get_mut(slot.index),
        }
    }

    /// Find the controller bound to `binding`.
    pub fn find(&self, binding: Binding) -> Option<Slot> {
        let root = self
            .controllers
            .iter()
            .position(|c| c.binding == binding)
            .map(|index| Slot {
                folder: None,
                index,
            });
        root.or_else(|| {
            self.folders.iter().enumerate().find_map(|(f, folder)| {
                folder
                    .controllers
                    .iter()
                    .position(|c| c.binding == binding)
                    .map(|index| Slot {
                        folder: Some(f),
                        index,
                    })
            })
        })
    }

    /// Rows from top to bottom for a window `screen_width` pixels wide.
    pub fn layout(&self, screen_width: f32) -> Vec<Row> {
        let mut rows = RowStack {
            x: (screen_width - PANEL_WIDTH).max(0.0),
            rows: Vec::new(),
        };

        rows.push(RowKind::Title, 0.0);
        if self.collapsed {
            return rows.rows;
        }

        rows.controllers(&self.controllers, None, 0.0);
        for (f, folder) in self.folders.iter().enumerate() {
            rows.push(RowKind::FolderHeader(f), 0.0);
            if folder.open {
                rows.controllers(&folder.controllers, Some(f), INDENT);
            }
        }
        rows.rows
    }

    fn row_at(&self, position: Vec2, screen_width: f32) -> Option<Row> {
        self.layout(screen_width)
            .into_iter()
            .find(|row| row.rect.contains(position.x, position.y))
    }

    /// React to one frame of input and return the edits it made.
    pub fn update(&mut self, input: &PanelInput, screen: Vec2) -> Vec<OptionChange> {
        if input.toggle_visibility {
            self.set_visible(!self.visible);
            log::debug!("panel {}", if self.visible { "shown" } else { "hidden" });
        }
        if !self.visible {
            return Vec::new();
        }

        let hit = input.pointer.and_then(|p| self.row_at(p, screen.x));
        self.hovered = hit.is_some();

        let mut changes = Vec::new();

        if input.pressed {
            if let (Some(row), Some(pointer)) = (hit, input.pointer) {
                self.press(row, pointer, &mut changes);
            }
        } else if input.down {
            if let (Some(drag), Some(pointer)) = (self.drag, input.pointer) {
                self.drag_to(drag, pointer.x, screen.x, &mut changes);
            }
        }

        if input.released || (!input.down && !input.pressed) {
            self.drag = None;
        }
        changes
    }

    fn press(&mut self, row: Row, pointer: Vec2, changes: &mut Vec<OptionChange>) {
        let slot = match row.kind {
            RowKind::Title => {
                self.collapsed = !self.collapsed;
                return;
            }
            RowKind::FolderHeader(f) => {
                if let Some(folder) = self.folders.get_mut(f) {
                    folder.open = !folder.open;
                }
                return;
            }
            RowKind::ColorChannel(slot, channel) => {
                self.start_drag(Drag::Channel(slot, channel), row, pointer, changes);
                return;
            }
            RowKind::Controller(slot) => slot,
        };

        if let Some(Controller {
            kind: ControllerKind::Slider { .. },
            ..
        }) = self.controller(slot)
        {
            self.start_drag(Drag::Slider(slot), row, pointer, changes);
            return;
        }

        let Some(controller) = self.controller_mut(slot) else {
            return;
        };
        match &mut controller.kind {
            ControllerKind::Toggle { value } => {
                *value = !*value;
                changes.extend(controller.change());
            }
            ControllerKind::Color { expanded, .. } => *expanded = !*expanded,
            ControllerKind::Slider { .. } => {}
        }
    }

    /// Only a press on the bar grabs it. It always reports the value under
    /// the pointer, even if unchanged.
    fn start_drag(&mut self, drag: Drag, row: Row, pointer: Vec2, changes: &mut Vec<OptionChange>) {
        let track = row.track();
        if !track.contains(pointer.x, pointer.y) {
            return;
        }
        self.drag = Some(drag);
        if !self.apply_drag(drag, track, pointer.x, changes) {
            let slot = match drag {
                Drag::Slider(slot) | Drag::Channel(slot, _) => slot,
            };
            changes.extend(self.controller(slot).and_then(Controller::change));
        }
    }

    fn drag_to(&mut self, drag: Drag, x: f32, screen_width: f32, changes: &mut Vec<OptionChange>) {
        let wanted = match drag {
            Drag::Slider(slot) => RowKind::Controller(slot),
            Drag::Channel(slot, channel) => RowKind::ColorChannel(slot, channel),
        };
        // Layout can't change mid-drag, but the window can be resized.
        let Some(row) = self
            .layout(screen_width)
            .into_iter()
            .find(|row| row.kind == wanted)
        else {
            self.drag = None;
            return;
        };
        self.apply_drag(drag, row.track(), x, changes);
    }

    /// Move the dragged value to `x`; returns whether it changed.
    fn apply_drag(
        &mut self,
        drag: Drag,
        track: Rect,
        x: f32,
        changes: &mut Vec<OptionChange>,
    ) -> bool {
        let slot = match drag {
            Drag::Slider(slot) | Drag::Channel(slot, _) => slot,
        };
        let Some(controller) = self.controller_mut(slot) else {
            return false;
        };

        let changed = match (&mut controller.kind, drag) {
            (ControllerKind::Slider { min, max, value }, Drag::Slider(_)) => {
                let new = slider_value(track, x, *min, *max);
                let changed = new != *value;
                *value = new;
                changed
            }
            (ControllerKind::Color { value, hsv, .. }, Drag::Channel(_, channel)) => {
                let (min, max) = channel.range();
                let new = slider_value(track, x, min, max);
                let component = match channel {
                    Channel::Hue => &mut hsv.0,
                    Channel::Saturation => &mut hsv.1,
                    Channel::Value => &mut hsv.2,
                };
                let changed = new != *component;
                *component = new;
                *value = Color::from_hsv(hsv.0, hsv.1, hsv.2);
                changed
            }
            _ => false,
        };

        if changed {
            changes.extend(controller.change());
        }
        changed
    }

    pub fn draw(&self, draw: &mut Draw2d, assets: &Assets, font: Option<FontId>, screen: Vec2) {
        if !self.visible {
            return;
        }
        let rows = self.layout(screen.x);
        let Some(last) = rows.last() else {
            return;
        };
        let bounds = Rect::new(
            rows[0].rect.x,
            0.0,
            PANEL_WIDTH,
            last.rect.bottom(),
        );
        draw.rect(bounds, ROW_BG);

        let text_y = |row: &Row| {
            let size = font.and_then(|id| assets.font(id)).map_or(12.0, |f| f.size());
            row.rect.y + (ROW_HEIGHT - size) / 2.0 - 1.0
        };
        let text = |draw: &mut Draw2d, x: f32, row: &Row, s: &str, color: Color| {
            if let Some(id) = font {
                draw.text(assets, id, x, text_y(row), s, color);
            }
        };

        for row in &rows {
            let left = row.rect.x + row.indent + PAD;
            match row.kind {
                RowKind::Title => {
                    draw.rect(row.rect, HEADER_BG);
                    let marker = if self.collapsed { "+" } else { "-" };
                    text(draw, left, row, &format!("{marker} {}", self.title), TEXT);
                    text(draw, row.rect.right() - 58.0, row, "[H] hide", MUTED);
                }
                RowKind::FolderHeader(f) => {
                    let Some(folder) = self.folders.get(f) else {
                        continue;
                    };
                    draw.rect(row.rect, HEADER_BG);
                    let marker = if folder.open { "-" } else { "+" };
                    text(draw, left, row, &format!("{marker} {}", folder.title), TEXT);
                }
                RowKind::Controller(slot) => {
                    let Some(controller) = self.controller(slot) else {
                        continue;
                    };
                    text(draw, left, row, &controller.label, MUTED);
                    let track = row.track();
                    match &controller.kind {
                        ControllerKind::Slider { min, max, value } => {
                            draw_bar(draw, track, slider_fraction(*value, *min, *max));
                            text(draw, track.right() + PAD, row, &format_value(*value, *min, *max), TEXT);
                        }
                        ControllerKind::Toggle { value } => {
                            let size = track.height;
                            let bx = Rect::new(track.x, track.y, size, size);
                            draw.rect(bx, TRACK);
                            if *value {
                                draw.rect(Rect::new(bx.x + 3.0, bx.y + 3.0, size - 6.0, size - 6.0), FILL);
                            }
                        }
                        ControllerKind::Color { value, .. } => {
                            let swatch = Rect::new(track.x, track.y, track.width, track.height);
                            draw.rect(swatch, *value);
                            draw.outline(swatch, 1.0, Color::PANEL_BORDER);
                            text(draw, track.right() + PAD, row, &value.to_hex_string(), TEXT);
                        }
                    }
                }
                RowKind::ColorChannel(slot, channel) => {
                    let Some(ControllerKind::Color { hsv, .. }) =
                        self.controller(slot).map(|c| &c.kind)
                    else {
                        continue;
                    };
                    let value = match channel {
                        Channel::Hue => hsv.0,
                        Channel::Saturation => hsv.1,
                        Channel::Value => hsv.2,
                    };
                    let (min, max) = channel.range();
                    text(draw, left, row, channel.label(), MUTED);
                    let track = row.track();
                    draw_bar(draw, track, slider_fraction(value, min, max));
                    text(draw, track.right() + PAD, row, &format_value(value, min, max), TEXT);
                }
            }
        }
        draw.outline(bounds, 1.0, Color::PANEL_BORDER);
    }
}

fn draw_bar(draw: &mut Draw2d, track: Rect, fraction: f32) {
    draw.rect(track, TRACK);
    draw.rect(Rect::new(track.x, track.y, track.width * fraction, track.height), FILL);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Vec2 = Vec2::new(1280.0, 720.0);

    fn click(at: Vec2) -> PanelInput {
        PanelInput {
            pointer: Some(at),
            pressed: true,
            down: true,
            ..PanelInput::default()
        }
    }

    fn row(panel: &Panel, kind: RowKind) -> Row {
        panel
            .layout(SCREEN.x)
            .into_iter()
            .find(|r| r.kind == kind)
            .unwrap()
    }

    fn slot_of(panel: &Panel, option: NumericOption) -> Slot {
        panel.find(Binding::Numeric(option)).unwrap()
    }

    #[test]
    fn layout_mirrors_option_groups() {
        let panel = Panel::for_options(&SceneOptions::default());
        let rows = panel.layout(SCREEN.x);
        // title, 3 root controllers, 2 folders with 3 sliders each
        assert_eq!(rows.len(), 1 + 3 + 2 * (1 + 3));
        assert_eq!(rows[0].rect.x, SCREEN.x - PANEL_WIDTH);
        assert!(rows.windows(2).all(|w| w[1].rect.y == w[0].rect.bottom()));
        assert_eq!(panel.folders[0].title, "Spotlight");
        assert_eq!(panel.folders[1].controllers[2].label, "bloomRadius");
    }

    #[test]
    fn slider_mapping_is_clamped() {
        let track = Rect::new(100.0, 0.0, 200.0, 10.0);
        assert_eq!(slider_value(track, 100.0, 0.0, 20.0), 0.0);
        assert_eq!(slider_value(track, 200.0, 0.0, 20.0), 10.0);
        assert_eq!(slider_value(track, 50.0, 0.0, 20.0), 0.0);
        assert_eq!(slider_value(track, 900.0, 0.0, 20.0), 20.0);
        assert_eq!(slider_fraction(0.05, 0.0, 0.1), 0.5);
        assert_eq!(slider_fraction(3.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn dragging_a_slider_emits_changes() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let slot = slot_of(&panel, NumericOption::Intensity);
        let track = row(&panel, RowKind::Controller(slot)).track();

        let centre = Vec2::new(track.x + track.width / 2.0, track.y + 2.0);
        let changes = panel.update(&click(centre), SCREEN);
        assert_eq!(changes.len(), 1);
        let OptionChange::Numeric(option, value) = changes[0] else {
            panic!("expected a numeric change, got {:?}", changes[0]);
        };
        assert_eq!(option, NumericOption::Intensity);
        assert!((value - 10.0).abs() < 1e-4);
        assert!(panel.captures_pointer());

        // Dragging far past the end clamps to the maximum, even off the panel.
        let held = PanelInput {
            pointer: Some(Vec2::new(5000.0, 400.0)),
            down: true,
            ..PanelInput::default()
        };
        let changes = panel.update(&held, SCREEN);
        assert_eq!(changes, vec![OptionChange::Numeric(NumericOption::Intensity, 20.0)]);

        let released = PanelInput {
            pointer: Some(Vec2::new(10.0, 400.0)),
            released: true,
            ..PanelInput::default()
        };
        assert!(panel.update(&released, SCREEN).is_empty());
        assert!(!panel.captures_pointer());
    }

    #[test]
    fn pressing_a_slider_label_leaves_the_value_alone() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let slot = slot_of(&panel, NumericOption::Intensity);
        let r = row(&panel, RowKind::Controller(slot));
        let track = r.track();

        let on_label = Vec2::new(r.rect.x + r.indent + PAD + 5.0, track.y + 2.0);
        assert!(on_label.x < track.x);
        assert!(panel.update(&click(on_label), SCREEN).is_empty());

        // Holding after a missed press must not start a drag either.
        let held = PanelInput {
            pointer: Some(Vec2::new(track.x + 1.0, track.y + 2.0)),
            down: true,
            ..PanelInput::default()
        };
        assert!(panel.update(&held, SCREEN).is_empty());
        assert_eq!(
            panel.controller(slot).unwrap().change(),
            Some(OptionChange::Numeric(NumericOption::Intensity, 10.0))
        );
    }

    #[test]
    fn toggle_flips_wireframe() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let slot = panel.find(Binding::Wireframe).unwrap();
        let r = row(&panel, RowKind::Controller(slot));
        let at = Vec2::new(r.rect.x + 20.0, r.rect.y + 5.0);
        assert_eq!(panel.update(&click(at), SCREEN), vec![OptionChange::Wireframe(true)]);
        assert_eq!(panel.update(&click(at), SCREEN), vec![OptionChange::Wireframe(false)]);
    }

    #[test]
    fn color_controller_expands_into_hsv_sliders() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let slot = panel.find(Binding::SphereColor).unwrap();
        let r = row(&panel, RowKind::Controller(slot));
        let before = panel.layout(SCREEN.x).len();

        let changes = panel.update(&click(Vec2::new(r.rect.x + 20.0, r.rect.y + 5.0)), SCREEN);
        assert!(changes.is_empty());
        assert_eq!(panel.layout(SCREEN.x).len(), before + 3);

        // Full value and saturation at hue 120° is pure green.
        let hue = row(&panel, RowKind::ColorChannel(slot, Channel::Hue)).track();
        let at = Vec2::new(hue.x + hue.width / 3.0, hue.y + 2.0);
        let changes = panel.update(&click(at), SCREEN);
        assert_eq!(changes.len(), 1);
        let OptionChange::SphereColor(color) = changes[0] else {
            panic!("expected a color change");
        };
        assert_eq!(color.to_hex_string(), "#00ff00");
    }

    #[test]
    fn folders_collapse() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let header = row(&panel, RowKind::FolderHeader(0));
        let before = panel.layout(SCREEN.x).len();
        panel.update(&click(Vec2::new(header.rect.x + 5.0, header.rect.y + 5.0)), SCREEN);
        assert!(!panel.folders[0].open);
        assert_eq!(panel.layout(SCREEN.x).len(), before - 3);
        // Rows below moved up, so the Bloom header is now where angle was.
        assert!(row(&panel, RowKind::FolderHeader(1)).rect.y < header.rect.y + 2.0 * ROW_HEIGHT);
    }

    #[test]
    fn hidden_panel_ignores_the_pointer() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let hide = PanelInput {
            toggle_visibility: true,
            ..PanelInput::default()
        };
        panel.update(&hide, SCREEN);
        assert!(!panel.is_visible());

        let slot = slot_of(&panel, NumericOption::Speed);
        let track = row(&panel, RowKind::Controller(slot)).track();
        let changes = panel.update(&click(Vec2::new(track.x + 1.0, track.y + 1.0)), SCREEN);
        assert!(changes.is_empty());
        assert!(!panel.captures_pointer());

        panel.update(&hide, SCREEN);
        assert!(panel.is_visible());
    }

    #[test]
    fn pointer_elsewhere_is_not_captured() {
        let mut panel = Panel::for_options(&SceneOptions::default());
        let input = PanelInput {
            pointer: Some(Vec2::new(100.0, 100.0)),
            ..PanelInput::default()
        };
        panel.update(&input, SCREEN);
        assert!(!panel.captures_pointer());
    }

    #[test]
    fn values_are_formatted_for_their_range() {
        assert_eq!(format_value(0.005, 0.0, 0.1), "0.005");
        assert_eq!(format_value(0.85, 0.0, 1.0), "0.85");
        assert_eq!(format_value(10.0, 0.0, 20.0), "10.0");
    }
}
