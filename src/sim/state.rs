//! Scope state and core simulation types
//!
//! All mutable simulation state is consolidated here so the tick and the
//! renderer operate on one explicit object instead of ambient globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;

/// A sonar return on the scope
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: u32,
    /// Position in surface-local coordinates (pixels, origin top-left)
    pub pos: Vec2,
    /// Creation timestamp (epoch milliseconds)
    pub born_ms: f64,
    /// Hostile contacts render red and draw HIGH/CRITICAL threat levels
    pub is_target: bool,
    /// Set when the sweep paints the contact; cleared at every wraparound
    pub detected: bool,
}

impl Contact {
    pub fn age_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.born_ms
    }

    /// Screen-space angle from the scope center, matching the sweep convention
    pub fn sweep_bearing(&self, center: Vec2) -> f32 {
        (self.pos.y - center.y).atan2(self.pos.x - center.x)
    }
}

/// Threat classification shown in the detection popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }

    /// Popup text color for this level
    pub fn css_color(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "#ffaa00",
            ThreatLevel::Medium => "#ff6600",
            ThreatLevel::High => "#ff3333",
            ThreatLevel::Critical => "#ff0000",
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, ThreatLevel::High | ThreatLevel::Critical)
    }
}

/// Synthesized intelligence shown when a contact is painted
#[derive(Debug, Clone)]
pub struct ContactReport {
    /// Degrees-minutes formatted, e.g. `35°17.201'N`
    pub latitude: String,
    pub longitude: String,
    /// 0-360, 0 = surface north (up)
    pub bearing_deg: f32,
    /// 0-5 notional units from own ship
    pub distance_units: f32,
    pub threat: ThreatLevel,
    /// `HH:MM:SSZ`
    pub logged_at: String,
}

/// Detection popup lifecycle
#[derive(Debug, Clone)]
pub enum PopupState {
    Closed,
    Open {
        contact_id: u32,
        report: ContactReport,
        /// Basis for the auto-dismiss deadline; replaced wholesale when a
        /// later detection supersedes this one
        opened_at_ms: f64,
        /// Generation counter so the shell only rewrites popup DOM on change
        epoch: u64,
    },
}

impl PopupState {
    pub fn is_open(&self) -> bool {
        matches!(self, PopupState::Open { .. })
    }
}

/// Missile countdown lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownState {
    Idle,
    Counting { remaining: u8, next_tick_ms: f64 },
    /// Post-impact hold before the launch control rearms
    Impact { until_ms: f64 },
}

impl CountdownState {
    /// True for the whole counting -> impact -> rearm span; the launch
    /// control stays disabled while engaged
    pub fn is_engaged(&self) -> bool {
        !matches!(self, CountdownState::Idle)
    }
}

/// One-shot simulation events, drained by the shell each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScopeEvent {
    /// The sweep painted a contact; play the detection ping
    SweepContact { target: bool },
    /// Countdown decremented; play the short 800 Hz beep
    CountdownTick { remaining: u8 },
    /// Warhead impact; play the explosion and run the flash/fireball overlays
    Impact,
}

/// Complete scope state
pub struct ScopeState {
    pub seed: u64,
    pub rng: Pcg32,
    /// When false all simulation advances halt
    pub powered: bool,
    /// Sweep angle in [0, 2π); wrap starts a new detection cycle
    pub sweep_angle: f32,
    pub contacts: Vec<Contact>,
    /// Cumulative count of contacts ever observed; never decreases
    pub contacts_observed: u64,
    /// Contact selected by the open popup. Names a live contact except while
    /// a launch sequence is engaged (the impact removes the contact but the
    /// popup holds until rearm)
    pub current_target: Option<u32>,
    /// Side length of the square sonar surface (CSS pixels)
    pub surface: f32,
    pub popup: PopupState,
    pub countdown: CountdownState,
    /// Deadline for the next automatic spawn
    pub next_spawn_at_ms: f64,
    /// Last accepted surface click (debounce basis)
    pub last_click_ms: f64,
    /// Cosmetic range readout
    pub range_reading: f32,
    pub events: Vec<ScopeEvent>,
    popup_epoch: u64,
    next_id: u32,
}

impl ScopeState {
    /// Create a powered-on scope. `start_ms` anchors the spawn schedule.
    pub fn new(seed: u64, start_ms: f64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            powered: true,
            sweep_angle: 0.0,
            contacts: Vec::new(),
            contacts_observed: 0,
            current_target: None,
            surface: MAX_SURFACE,
            popup: PopupState::Closed,
            countdown: CountdownState::Idle,
            next_spawn_at_ms: start_ms + FIRST_SPAWN_DELAY_MS,
            last_click_ms: f64::NEG_INFINITY,
            range_reading: RANGE_BASELINE,
            events: Vec::new(),
            popup_epoch: 0,
            next_id: 1,
        }
    }

    /// Allocate a new contact ID
    pub fn next_contact_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn center(&self) -> Vec2 {
        Vec2::splat(self.surface / 2.0)
    }

    /// Radius of the outermost range ring
    pub fn scope_radius(&self) -> f32 {
        self.surface / 2.0 - SCOPE_MARGIN
    }

    pub fn set_surface(&mut self, size: f32) {
        self.surface = size.min(MAX_SURFACE);
    }

    pub fn contact(&self, id: u32) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Close the popup and drop the target selection
    pub fn close_popup(&mut self) {
        self.popup = PopupState::Closed;
        self.current_target = None;
    }

    /// Open the popup for a contact, superseding any previous activation
    pub fn open_popup(&mut self, contact_id: u32, report: ContactReport, now_ms: f64) {
        self.popup_epoch += 1;
        self.current_target = Some(contact_id);
        self.popup = PopupState::Open {
            contact_id,
            report,
            opened_at_ms: now_ms,
            epoch: self.popup_epoch,
        };
    }
}
