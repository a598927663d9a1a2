//! Gesture recognition for raw pointer, touch and wheel input.
//!
//! The classifier turns a stream of `PointerEvent`s into tagged
//! `GestureEvent`s so the router never sees raw contacts:
//!
//! - one contact that barely moves and lifts quickly is a `Tap`
//! - one contact that moves past the threshold produces `Drag` deltas
//! - two contacts produce `Pinch` scale factors, and the sequence can never
//!   become a tap afterwards
//! - a touch held still for the long-press delay arms rotation; further
//!   movement produces `Rotate` deltas
//! - wheel input is passed through as `Scroll`

use std::collections::BTreeMap;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

pub type PointerId = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Raw input, timestamps in seconds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down { id: PointerId, kind: PointerKind, pos: Pos2, time: f64 },
    Move { id: PointerId, pos: Pos2, time: f64 },
    Up { id: PointerId, pos: Pos2, time: f64 },
    Cancel { id: PointerId },
    Wheel { delta: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GestureEvent {
    Tap { pos: Pos2 },
    Drag { delta: Vec2 },
    // scale > 1 when the contacts spread apart
    Pinch { scale: f32, center: Pos2 },
    LongPress { pos: Pos2 },
    Rotate { delta: Vec2 },
    Scroll { delta: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    pub tap_move_threshold_px: f32,
    pub tap_max_duration: f64,
    pub long_press_delay: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { tap_move_threshold_px: 10.0, tap_max_duration: 0.3, long_press_delay: 0.5 }
    }
}

#[derive(Copy, Clone, Debug)]
struct Contact {
    last: Pos2,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Phase {
    Idle,
    // Down, not yet classified
    Pending,
    Dragging,
    Rotating,
    Pinching { last_distance: f32 },
    // Multi-touch ended with contacts still down; swallow until all lift
    Settling,
}

#[derive(Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    contacts: BTreeMap<PointerId, Contact>,
    kind: PointerKind,
    phase: Phase,
    origin: Pos2,
    started_at: f64,
    travelled: f32,
    max_contacts: usize,
    long_press_deadline: Option<f64>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            contacts: BTreeMap::new(),
            kind: PointerKind::Mouse,
            phase: Phase::Idle,
            origin: Pos2::ZERO,
            started_at: 0.0,
            travelled: 0.0,
            max_contacts: 0,
            long_press_deadline: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn active_contacts(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn long_press_pending(&self) -> bool {
        self.long_press_deadline.is_some()
    }

    pub fn handle(&mut self, event: PointerEvent) -> Vec<GestureEvent> {
        match event {
            PointerEvent::Down { id, kind, pos, time } => self.on_down(id, kind, pos, time),
            PointerEvent::Move { id, pos, .. } => self.on_move(id, pos),
            PointerEvent::Up { id, time, .. } => self.on_up(id, time),
            PointerEvent::Cancel { id } => {
                self.contacts.remove(&id);
                if self.contacts.is_empty() {
                    self.reset();
                } else {
                    self.phase = Phase::Settling;
                    self.long_press_deadline = None;
                }
                Vec::new()
            }
            PointerEvent::Wheel { delta } => {
                if delta == 0.0 { Vec::new() } else { vec![GestureEvent::Scroll { delta }] }
            }
        }
    }

    /// Advance timers. Fires `LongPress` once the delay elapses on a still touch.
    pub fn tick(&mut self, now: f64) -> Option<GestureEvent> {
        let deadline = self.long_press_deadline?;
        if now < deadline {
            return None;
        }
        self.long_press_deadline = None;
        if self.phase != Phase::Pending || self.contacts.len() != 1 {
            return None;
        }
        self.phase = Phase::Rotating;
        let pos = self.contacts.values().next().map(|c| c.last).unwrap_or(self.origin);
        Some(GestureEvent::LongPress { pos })
    }

    fn reset(&mut self) {
        self.contacts.clear();
        self.phase = Phase::Idle;
        self.travelled = 0.0;
        self.max_contacts = 0;
        self.long_press_deadline = None;
    }

    fn on_down(&mut self, id: PointerId, kind: PointerKind, pos: Pos2, time: f64) -> Vec<GestureEvent> {
        if self.contacts.is_empty() {
            self.reset();
            self.kind = kind;
            self.origin = pos;
            self.started_at = time;
            self.phase = Phase::Pending;
            // long press is a touch-only gesture
            if kind == PointerKind::Touch {
                self.long_press_deadline = Some(time + self.config.long_press_delay);
            }
        }
        self.contacts.insert(id, Contact { last: pos });
        self.max_contacts = self.max_contacts.max(self.contacts.len());

        if self.contacts.len() >= 2 {
            self.long_press_deadline = None;
            if !matches!(self.phase, Phase::Pinching { .. }) {
                let last_distance = self.pinch_pair().map(|(a, b)| a.distance(b)).unwrap_or(0.0);
                self.phase = Phase::Pinching { last_distance };
            }
        }
        Vec::new()
    }

    fn on_move(&mut self, id: PointerId, pos: Pos2) -> Vec<GestureEvent> {
        let Some(contact) = self.contacts.get_mut(&id) else {
            // hover without a button down
            return Vec::new();
        };
        let delta = pos - contact.last;
        contact.last = pos;

        match self.phase {
            Phase::Pending => {
                self.travelled += delta.length();
                if self.travelled >= self.config.tap_move_threshold_px {
                    self.long_press_deadline = None;
                    self.phase = Phase::Dragging;
                    // report everything since the contact started
                    return vec![GestureEvent::Drag { delta: pos - self.origin }];
                }
                Vec::new()
            }
            Phase::Dragging => {
                self.travelled += delta.length();
                vec![GestureEvent::Drag { delta }]
            }
            Phase::Rotating => {
                self.travelled += delta.length();
                vec![GestureEvent::Rotate { delta }]
            }
            Phase::Pinching { last_distance } => {
                let Some((a, b)) = self.pinch_pair() else { return Vec::new() };
                let distance = a.distance(b);
                self.phase = Phase::Pinching { last_distance: distance };
                if last_distance <= f32::EPSILON || distance <= f32::EPSILON {
                    return Vec::new();
                }
                let scale = distance / last_distance;
                if (scale - 1.0).abs() <= f32::EPSILON {
                    return Vec::new();
                }
                vec![GestureEvent::Pinch { scale, center: a.lerp(b, 0.5) }]
            }
            Phase::Idle | Phase::Settling => Vec::new(),
        }
    }

    fn on_up(&mut self, id: PointerId, time: f64) -> Vec<GestureEvent> {
        if self.contacts.remove(&id).is_none() {
            return Vec::new();
        }
        if !self.contacts.is_empty() {
            // one finger of a pinch lifted; wait for the rest
            self.phase = Phase::Settling;
            return Vec::new();
        }

        let is_tap = self.phase == Phase::Pending
            && self.max_contacts == 1
            && self.travelled < self.config.tap_move_threshold_px
            // a mouse click without drag counts regardless of how long the button was held
            && (self.kind == PointerKind::Mouse || (time - self.started_at) <= self.config.tap_max_duration);
        let origin = self.origin;
        self.reset();
        if is_tap { vec![GestureEvent::Tap { pos: origin }] } else { Vec::new() }
    }

    // First two contacts by id
    fn pinch_pair(&self) -> Option<(Pos2, Pos2)> {
        let mut it = self.contacts.values();
        let a = it.next()?.last;
        let b = it.next()?.last;
        Some((a, b))
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}
