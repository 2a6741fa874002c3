//! Raw pointer/keyboard events to camera and hit-test actions.
//!
//! A press becomes a drag once the pointer travels past the drag threshold;
//! a release without a drag is a click and selects synchronously. Hover
//! hit-tests are throttled to `hover_hz`; the latest throttled position is
//! kept and flushed by [`InputDispatcher::poll_hover`] on a later frame.

use glam::Vec2;
use std::time::Duration;

use crate::core::config::{CameraConfig, InteractionConfig};
use crate::core::types::PresentationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Vec2, button: PointerButton },
    PointerMove { pos: Vec2 },
    PointerUp { pos: Vec2, button: PointerButton },
    /// Positive `delta_lines` zooms in.
    Wheel { pos: Vec2, delta_lines: f32 },
    PointerLeave,
    /// Unit direction the view should move toward (arrow keys).
    KeyPan { direction: Vec2 },
    KeyZoom { steps: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Any user input; suspends globe auto-rotation.
    Interaction,
    /// Move content by a screen delta. `immediate` for drags.
    Pan { delta: Vec2, immediate: bool },
    /// Rotate the globe by a screen delta.
    Orbit { delta: Vec2 },
    ZoomAt { pos: Vec2, factor: f32 },
    ZoomCenter { factor: f32 },
    Hover { pos: Vec2 },
    ClearHover,
    Select { pos: Vec2 },
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    last: Vec2,
    dragging: bool,
    button: PointerButton,
}

#[derive(Debug, Clone)]
pub struct InputDispatcher {
    drag_threshold: f32,
    hover_interval: Duration,
    wheel_step: f32,
    keyboard_pan_px: f32,
    mode: PresentationMode,
    press: Option<Press>,
    last_hover: Option<Duration>,
    pending_hover: Option<Vec2>,
}

impl InputDispatcher {
    pub fn new(interaction: &InteractionConfig, camera: &CameraConfig, mode: PresentationMode) -> Self {
        Self {
            drag_threshold: interaction.drag_threshold_px,
            hover_interval: Duration::from_secs_f32(1.0 / interaction.hover_hz.max(1e-3)),
            wheel_step: camera.wheel_step,
            keyboard_pan_px: camera.keyboard_pan_px,
            mode,
            press: None,
            last_hover: None,
            pending_hover: None,
        }
    }

    pub fn set_mode(&mut self, mode: PresentationMode) {
        self.mode = mode;
        self.press = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.press.map(|p| p.dragging).unwrap_or(false)
    }

    fn drag(&self, delta: Vec2) -> InputAction {
        match self.mode {
            PresentationMode::Flat => InputAction::Pan { delta, immediate: true },
            PresentationMode::Globe => InputAction::Orbit { delta },
        }
    }

    fn hover_due(&self, now: Duration) -> bool {
        self.last_hover
            .map(|last| now.saturating_sub(last) >= self.hover_interval)
            .unwrap_or(true)
    }

    fn request_hover(&mut self, pos: Vec2, now: Duration, actions: &mut Vec<InputAction>) {
        if self.hover_due(now) {
            self.last_hover = Some(now);
            self.pending_hover = None;
            actions.push(InputAction::Hover { pos });
        } else {
            self.pending_hover = Some(pos);
        }
    }

    pub fn handle(&mut self, event: InputEvent, now: Duration) -> Vec<InputAction> {
        let mut actions = Vec::new();
        match event {
            InputEvent::PointerDown { pos, button } => {
                self.press = Some(Press {
                    origin: pos,
                    last: pos,
                    dragging: false,
                    button,
                });
                actions.push(InputAction::Interaction);
            }
            InputEvent::PointerMove { pos } => match self.press {
                Some(mut press) => {
                    if !press.dragging && pos.distance(press.origin) > self.drag_threshold {
                        press.dragging = true;
                    }
                    if press.dragging {
                        let delta = pos - press.last;
                        press.last = pos;
                        actions.push(InputAction::Interaction);
                        actions.push(self.drag(delta));
                    }
                    self.press = Some(press);
                }
                None => self.request_hover(pos, now, &mut actions),
            },
            InputEvent::PointerUp { pos, button } => {
                if let Some(press) = self.press.take() {
                    if !press.dragging && press.button == PointerButton::Primary && button == press.button {
                        actions.push(InputAction::Select { pos });
                    }
                }
                self.request_hover(pos, now, &mut actions);
            }
            InputEvent::Wheel { pos, delta_lines } => {
                if delta_lines != 0.0 && delta_lines.is_finite() {
                    actions.push(InputAction::Interaction);
                    actions.push(InputAction::ZoomAt {
                        pos,
                        factor: self.wheel_step.powf(delta_lines),
                    });
                }
            }
            InputEvent::PointerLeave => {
                self.press = None;
                self.pending_hover = None;
                actions.push(InputAction::ClearHover);
            }
            InputEvent::KeyPan { direction } => {
                let delta = -direction * self.keyboard_pan_px;
                actions.push(InputAction::Interaction);
                actions.push(match self.mode {
                    PresentationMode::Flat => InputAction::Pan { delta, immediate: false },
                    PresentationMode::Globe => InputAction::Orbit { delta },
                });
            }
            InputEvent::KeyZoom { steps } => {
                actions.push(InputAction::Interaction);
                actions.push(InputAction::ZoomCenter {
                    factor: self.wheel_step.powf(steps),
                });
            }
        }
        actions
    }

    /// Flush a throttled hover position once the interval has elapsed.
    pub fn poll_hover(&mut self, now: Duration) -> Option<InputAction> {
        let pos = self.pending_hover?;
        if !self.hover_due(now) {
            return None;
        }
        self.pending_hover = None;
        self.last_hover = Some(now);
        Some(InputAction::Hover { pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> InputDispatcher {
        InputDispatcher::new(&InteractionConfig::default(), &CameraConfig::default(), PresentationMode::Flat)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_click_selects() {
        let mut d = dispatcher();
        d.handle(InputEvent::PointerDown { pos: Vec2::new(10.0, 10.0), button: PointerButton::Primary }, ms(0));
        d.handle(InputEvent::PointerMove { pos: Vec2::new(12.0, 11.0) }, ms(5));
        let actions = d.handle(InputEvent::PointerUp { pos: Vec2::new(12.0, 11.0), button: PointerButton::Primary }, ms(10));
        assert!(actions.contains(&InputAction::Select { pos: Vec2::new(12.0, 11.0) }));
    }

    #[test]
    fn test_drag_pans_and_does_not_select() {
        let mut d = dispatcher();
        d.handle(InputEvent::PointerDown { pos: Vec2::ZERO, button: PointerButton::Primary }, ms(0));
        let actions = d.handle(InputEvent::PointerMove { pos: Vec2::new(20.0, 0.0) }, ms(5));
        assert!(actions.contains(&InputAction::Pan { delta: Vec2::new(20.0, 0.0), immediate: true }));
        let actions = d.handle(InputEvent::PointerMove { pos: Vec2::new(25.0, 5.0) }, ms(10));
        assert!(actions.contains(&InputAction::Pan { delta: Vec2::new(5.0, 5.0), immediate: true }));
        let actions = d.handle(InputEvent::PointerUp { pos: Vec2::new(25.0, 5.0), button: PointerButton::Primary }, ms(15));
        assert!(!actions.iter().any(|a| matches!(a, InputAction::Select { .. })));
    }

    #[test]
    fn test_globe_drag_orbits() {
        let mut d = dispatcher();
        d.set_mode(PresentationMode::Globe);
        d.handle(InputEvent::PointerDown { pos: Vec2::ZERO, button: PointerButton::Primary }, ms(0));
        let actions = d.handle(InputEvent::PointerMove { pos: Vec2::new(0.0, 30.0) }, ms(5));
        assert!(actions.contains(&InputAction::Orbit { delta: Vec2::new(0.0, 30.0) }));
    }

    #[test]
    fn test_hover_throttled() {
        let mut d = dispatcher();
        let mut hovers = 0;
        // 60 Hz pointer motion for one second.
        for frame in 0..60u64 {
            let now = Duration::from_micros(frame * 16_667);
            let pos = Vec2::new(frame as f32, 0.0);
            hovers += d
                .handle(InputEvent::PointerMove { pos }, now)
                .iter()
                .filter(|a| matches!(a, InputAction::Hover { .. }))
                .count();
            if d.poll_hover(now).is_some() {
                hovers += 1;
            }
        }
        assert!(hovers <= 26, "{hovers} hover tests in one second");
        assert!(hovers >= 15);
    }

    #[test]
    fn test_pending_hover_flushed() {
        let mut d = dispatcher();
        d.handle(InputEvent::PointerMove { pos: Vec2::new(1.0, 1.0) }, ms(0));
        let actions = d.handle(InputEvent::PointerMove { pos: Vec2::new(2.0, 2.0) }, ms(10));
        assert!(actions.is_empty());
        assert!(d.poll_hover(ms(20)).is_none());
        assert_eq!(d.poll_hover(ms(45)), Some(InputAction::Hover { pos: Vec2::new(2.0, 2.0) }));
        assert!(d.poll_hover(ms(100)).is_none());
    }

    #[test]
    fn test_wheel_factor_and_leave() {
        let mut d = dispatcher();
        let actions = d.handle(InputEvent::Wheel { pos: Vec2::ZERO, delta_lines: 2.0 }, ms(0));
        let factor = CameraConfig::default().wheel_step.powf(2.0);
        assert!(actions.contains(&InputAction::ZoomAt { pos: Vec2::ZERO, factor }));
        assert_eq!(d.handle(InputEvent::PointerLeave, ms(1)), vec![InputAction::ClearHover]);
    }

    #[test]
    fn test_key_pan_moves_view_toward_direction() {
        let mut d = dispatcher();
        let actions = d.handle(InputEvent::KeyPan { direction: Vec2::X }, ms(0));
        assert!(actions.contains(&InputAction::Pan { delta: Vec2::new(-40.0, -0.0), immediate: false }));
    }
}
