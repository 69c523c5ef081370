//! Per-frame simulation advance
//!
//! One cooperative tick per animation frame. Ordering within a tick is a
//! contract: input handling, then sweep advance (and wrap reset), then contact
//! expiry, then popup dismissal, then countdown, then hit detection, then
//! spawn evaluation. Expiry runs here, never in the renderer, so the render
//! pass observes a stable contact set.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::contact;
use super::state::{ContactReport, CountdownState, PopupState, ScopeEvent, ScopeState};
use crate::consts::*;
use crate::{angular_separation, normalize_sweep};

/// One-shot commands for a single tick.
///
/// The shell sets these from DOM events and clears them after the tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Power button pressed
    pub toggle_power: bool,
    /// Missile launch requested
    pub launch: bool,
    /// Surface click/tap at the given surface-local coordinate
    pub click: Option<Vec2>,
}

/// Advance the scope by one frame. `dt` is the frame delta in seconds,
/// `now_ms` the current epoch time in milliseconds.
pub fn tick(state: &mut ScopeState, input: &TickInput, dt: f32, now_ms: f64) {
    if input.toggle_power {
        toggle_power(state);
    }
    if input.launch {
        start_countdown(state, now_ms);
    }

    if !state.powered {
        return;
    }

    advance_sweep(state, dt);
    expire_contacts(state, now_ms);
    dismiss_stale_popup(state, now_ms);
    advance_countdown(state, now_ms);
    detect_sweep_hits(state, now_ms);

    if let Some(pos) = input.click {
        try_click_spawn(state, pos, now_ms);
    }
    if now_ms >= state.next_spawn_at_ms {
        contact::spawn_periodic(state, now_ms);
        state.next_spawn_at_ms =
            now_ms + SPAWN_BASE_MS + state.rng.random_range(0.0..SPAWN_JITTER_MS);
    }

    state.range_reading = RANGE_BASELINE + RANGE_WOBBLE * ((now_ms * 0.001).sin() as f32);
}

fn toggle_power(state: &mut ScopeState) {
    state.powered = !state.powered;
    if !state.powered {
        state.contacts.clear();
        state.close_popup();
        // Aborting here keeps `current_target` pointing at live contacts only
        state.countdown = CountdownState::Idle;
    }
}

/// Rotate the sweep; wraparound starts a new detection cycle
fn advance_sweep(state: &mut ScopeState, dt: f32) {
    let advanced = state.sweep_angle + SWEEP_RATE * dt;
    if advanced >= TAU {
        for c in &mut state.contacts {
            c.detected = false;
        }
    }
    state.sweep_angle = normalize_sweep(advanced);
}

/// Drop contacts past their maximum age, detected or not
fn expire_contacts(state: &mut ScopeState, now_ms: f64) {
    state.contacts.retain(|c| c.age_ms(now_ms) <= CONTACT_MAX_AGE_MS);
    // While a launch sequence is engaged the popup stays up even though the
    // impact (or expiry) has removed the contact; the Impact -> Idle
    // transition closes it after the rearm hold.
    if let Some(id) = state.current_target
        && state.contact(id).is_none()
        && !state.countdown.is_engaged()
    {
        state.close_popup();
    }
}

fn dismiss_stale_popup(state: &mut ScopeState, now_ms: f64) {
    // The popup stays pinned while a launch sequence is running
    if state.countdown.is_engaged() {
        return;
    }
    let opened_at_ms = match &state.popup {
        PopupState::Open { opened_at_ms, .. } => *opened_at_ms,
        PopupState::Closed => return,
    };
    if now_ms - opened_at_ms >= POPUP_DISMISS_MS {
        state.close_popup();
    }
}

fn start_countdown(state: &mut ScopeState, now_ms: f64) {
    // No target or a sequence already running: silent no-op
    if state.current_target.is_none() || state.countdown.is_engaged() {
        return;
    }
    state.countdown = CountdownState::Counting {
        remaining: COUNTDOWN_START,
        next_tick_ms: now_ms + COUNTDOWN_STEP_MS,
    };
}

fn advance_countdown(state: &mut ScopeState, now_ms: f64) {
    match state.countdown {
        CountdownState::Idle => {}
        CountdownState::Counting {
            remaining,
            next_tick_ms,
        } => {
            if now_ms < next_tick_ms {
                return;
            }
            let remaining = remaining - 1;
            if remaining == 0 {
                state.events.push(ScopeEvent::Impact);
                if let Some(id) = state.current_target {
                    state.contacts.retain(|c| c.id != id);
                }
                state.countdown = CountdownState::Impact {
                    until_ms: now_ms + REARM_DELAY_MS,
                };
            } else {
                state.events.push(ScopeEvent::CountdownTick { remaining });
                state.countdown = CountdownState::Counting {
                    remaining,
                    next_tick_ms: next_tick_ms + COUNTDOWN_STEP_MS,
                };
            }
        }
        CountdownState::Impact { until_ms } => {
            if now_ms >= until_ms {
                state.countdown = CountdownState::Idle;
                state.close_popup();
            }
        }
    }
}

/// Paint undetected contacts the sweep line has just passed over
fn detect_sweep_hits(state: &mut ScopeState, now_ms: f64) {
    let center = state.center();
    let mut newest_hit = None;
    for c in &mut state.contacts {
        if c.detected {
            continue;
        }
        if angular_separation(state.sweep_angle, c.sweep_bearing(center)) < HIT_THRESHOLD {
            c.detected = true;
            state.events.push(ScopeEvent::SweepContact { target: c.is_target });
            newest_hit = Some(c.id);
        }
    }

    // Newest detection wins the popup; never retarget mid-launch
    if let Some(id) = newest_hit
        && !state.countdown.is_engaged()
    {
        let Some(hit) = state.contact(id).cloned() else {
            return;
        };
        let half_surface = state.surface / 2.0;
        let report = ContactReport::compile(&hit, center, half_surface, now_ms, &mut state.rng);
        state.open_popup(id, report, now_ms);
    }
}

fn try_click_spawn(state: &mut ScopeState, pos: Vec2, now_ms: f64) {
    if now_ms - state.last_click_ms < CLICK_DEBOUNCE_MS {
        return;
    }
    state.last_click_ms = now_ms;
    contact::spawn_at_point(state, pos, now_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Contact;

    const FRAME: f32 = 1.0 / 60.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn powered_state() -> ScopeState {
        let mut state = ScopeState::new(12345, 0.0);
        // Push the spawn schedule out of the way for focused tests
        state.next_spawn_at_ms = f64::MAX;
        state
    }

    /// Place a contact at a known angle (screen convention) from center
    fn plant_contact(state: &mut ScopeState, angle: f32, is_target: bool, now_ms: f64) -> u32 {
        let id = state.next_contact_id();
        let pos = state.center() + crate::polar_to_cartesian(150.0, angle);
        state.contacts.push(Contact {
            id,
            pos,
            born_ms: now_ms,
            is_target,
            detected: false,
        });
        id
    }

    /// Run frames until `end_ms`, returning collected events
    fn run_until(state: &mut ScopeState, start_ms: f64, end_ms: f64) -> Vec<ScopeEvent> {
        let mut events = Vec::new();
        let mut now = start_ms;
        while now < end_ms {
            now += FRAME_MS;
            tick(state, &TickInput::default(), FRAME, now);
            events.append(&mut state.events);
        }
        events
    }

    #[test]
    fn test_sweep_stays_in_range_and_wrap_resets_detected() {
        let mut state = powered_state();
        plant_contact(&mut state, 0.3, false, 0.0);
        state.contacts[0].detected = true;

        let mut now = 0.0;
        let mut wrapped = false;
        // A bit more than one revolution at 0.48 rad/s
        for _ in 0..(14 * 60) {
            now += FRAME_MS;
            let before = state.sweep_angle;
            tick(&mut state, &TickInput::default(), FRAME, now);
            assert!((0.0..TAU).contains(&state.sweep_angle));
            if state.sweep_angle < before {
                wrapped = true;
                // Contact may have re-detected right after the wrap, but the
                // wrap itself must have cleared the flag first
                assert!(!state.contacts.is_empty());
            }
            // Keep the contact alive across the whole revolution
            state.contacts[0].born_ms = now;
        }
        assert!(wrapped);
    }

    #[test]
    fn test_detection_fires_once_per_revolution() {
        let mut state = powered_state();
        plant_contact(&mut state, 1.0, false, 0.0);

        // One full revolution, keeping the contact from aging out
        let mut pings = 0;
        let mut now = 0.0;
        for _ in 0..(13 * 60) {
            now += FRAME_MS;
            state.contacts[0].born_ms = now;
            tick(&mut state, &TickInput::default(), FRAME, now);
            pings += state
                .events
                .drain(..)
                .filter(|e| matches!(e, ScopeEvent::SweepContact { .. }))
                .count();
            if state.sweep_angle < 1.0 && pings > 0 {
                break;
            }
        }
        assert_eq!(pings, 1);
    }

    #[test]
    fn test_detection_is_wrap_correct() {
        let mut state = powered_state();
        // Contact just behind angle zero; sweep starts at zero, so the
        // shorter arc is tiny and the first frames must paint it
        plant_contact(&mut state, TAU - 0.01, false, 0.0);
        tick(&mut state, &TickInput::default(), FRAME, FRAME_MS);
        assert!(state.contacts[0].detected);
    }

    #[test]
    fn test_contacts_expire_after_max_age() {
        let mut state = powered_state();
        plant_contact(&mut state, 2.0, false, 0.0);
        state.contacts[0].detected = true;

        tick(&mut state, &TickInput::default(), FRAME, 7999.0);
        assert_eq!(state.contacts.len(), 1);
        tick(&mut state, &TickInput::default(), FRAME, 8001.0 + FRAME_MS);
        assert!(state.contacts.is_empty());
    }

    #[test]
    fn test_power_off_clears_contacts_and_popup() {
        let mut state = powered_state();
        let id = plant_contact(&mut state, 0.5, true, 0.0);
        let hit = state.contact(id).unwrap().clone();
        let center = state.center();
        let half = state.surface / 2.0;
        let report = ContactReport::compile(&hit, center, half, 0.0, &mut state.rng);
        state.open_popup(id, report, 0.0);

        let off = TickInput {
            toggle_power: true,
            ..Default::default()
        };
        tick(&mut state, &off, FRAME, 100.0);
        assert!(!state.powered);
        assert!(state.contacts.is_empty());
        assert!(!state.popup.is_open());
        assert!(state.current_target.is_none());

        // Power back on: clean slate, sim resumes
        let on = TickInput {
            toggle_power: true,
            ..Default::default()
        };
        tick(&mut state, &on, FRAME, 200.0);
        assert!(state.powered);
        assert!(state.contacts.is_empty());
    }

    #[test]
    fn test_launch_without_target_is_noop() {
        let mut state = powered_state();
        let input = TickInput {
            launch: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME, 100.0);
        assert_eq!(state.countdown, CountdownState::Idle);
        assert!(!state.countdown.is_engaged());
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_full_missile_sequence() {
        let mut state = powered_state();
        let target = plant_contact(&mut state, 0.0, true, 0.0);
        // The sweep starts on top of the contact, so the first tick paints it
        tick(&mut state, &TickInput::default(), FRAME, FRAME_MS);
        assert_eq!(state.current_target, Some(target));
        state.events.clear();

        let launch_ms = 100.0;
        let input = TickInput {
            launch: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME, launch_ms);
        assert!(state.countdown.is_engaged());

        // Keep the target from aging out during the countdown
        for c in &mut state.contacts {
            c.born_ms = launch_ms;
        }

        let events = run_until(&mut state, launch_ms, launch_ms + 3100.0);
        let impacts = events.iter().filter(|e| matches!(e, ScopeEvent::Impact)).count();
        let beeps = events
            .iter()
            .filter(|e| matches!(e, ScopeEvent::CountdownTick { .. }))
            .count();
        assert_eq!(impacts, 1);
        assert_eq!(beeps, 2); // at counts 2 and 1
        assert!(state.contact(target).is_none());
        assert!(state.countdown.is_engaged()); // still in the rearm hold
        // The report stays on screen through the hold, target gone or not
        assert!(state.popup.is_open());
        assert_eq!(state.current_target, Some(target));

        run_until(&mut state, launch_ms + 3100.0, launch_ms + 7200.0);
        assert_eq!(state.countdown, CountdownState::Idle);
        assert!(state.current_target.is_none());
        assert!(!state.popup.is_open());
    }

    #[test]
    fn test_second_launch_during_sequence_is_ignored() {
        let mut state = powered_state();
        plant_contact(&mut state, 0.0, true, 0.0);
        tick(&mut state, &TickInput::default(), FRAME, FRAME_MS);

        let input = TickInput {
            launch: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME, 100.0);
        let CountdownState::Counting { next_tick_ms, .. } = state.countdown else {
            panic!("countdown should be running");
        };

        // Re-pressing launch must not restart the schedule
        tick(&mut state, &input, FRAME, 500.0);
        let CountdownState::Counting {
            next_tick_ms: after, ..
        } = state.countdown
        else {
            panic!("countdown should still be running");
        };
        assert_eq!(next_tick_ms, after);
    }

    #[test]
    fn test_click_debounce() {
        let mut state = powered_state();
        let pos = Vec2::new(200.0, 200.0);

        let click = TickInput {
            click: Some(pos),
            ..Default::default()
        };
        tick(&mut state, &click, FRAME, 1000.0);
        tick(&mut state, &click, FRAME, 1300.0);
        assert_eq!(state.contacts.len(), 1);
        assert_eq!(state.contacts_observed, 1);

        // Past the debounce window the next click lands
        tick(&mut state, &click, FRAME, 1600.0);
        assert_eq!(state.contacts.len(), 2);
        assert_eq!(state.contacts_observed, 2);
    }

    #[test]
    fn test_observed_counter_never_decreases() {
        let mut state = powered_state();
        plant_contact(&mut state, 1.0, false, 0.0);
        state.contacts_observed = 1;

        // Let the contact expire; the counter must hold
        tick(&mut state, &TickInput::default(), FRAME, 9000.0);
        assert!(state.contacts.is_empty());
        assert_eq!(state.contacts_observed, 1);
    }

    #[test]
    fn test_periodic_spawn_schedule() {
        let mut state = ScopeState::new(99, 0.0);
        assert_eq!(state.next_spawn_at_ms, FIRST_SPAWN_DELAY_MS);

        // Before the deadline nothing spawns
        tick(&mut state, &TickInput::default(), FRAME, 1500.0);
        assert!(state.contacts.is_empty());

        tick(&mut state, &TickInput::default(), FRAME, 2100.0);
        assert_eq!(state.contacts.len(), 1);
        let next = state.next_spawn_at_ms;
        assert!(next >= 2100.0 + SPAWN_BASE_MS);
        assert!(next < 2100.0 + SPAWN_BASE_MS + SPAWN_JITTER_MS);
    }

    #[test]
    fn test_popup_auto_dismiss_and_supersede() {
        let mut state = powered_state();
        let first = plant_contact(&mut state, 0.0, false, 0.0);
        tick(&mut state, &TickInput::default(), FRAME, FRAME_MS);
        assert_eq!(state.current_target, Some(first));

        // A later detection supersedes the popup and restarts its clock
        let near_sweep = state.sweep_angle + 0.02;
        let second = plant_contact(&mut state, near_sweep, true, 3000.0);
        tick(&mut state, &TickInput::default(), FRAME, 3000.0);
        assert_eq!(state.current_target, Some(second));

        // 6s after the *second* activation, not the first
        tick(&mut state, &TickInput::default(), FRAME, 8000.0);
        assert!(state.popup.is_open());
        tick(&mut state, &TickInput::default(), FRAME, 9100.0);
        assert!(!state.popup.is_open());
        assert!(state.current_target.is_none());
    }

    #[test]
    fn test_unpowered_scope_is_inert() {
        let mut state = powered_state();
        let off = TickInput {
            toggle_power: true,
            ..Default::default()
        };
        tick(&mut state, &off, FRAME, 0.0);

        let angle = state.sweep_angle;
        state.next_spawn_at_ms = 0.0;
        let click = TickInput {
            click: Some(Vec2::new(100.0, 100.0)),
            ..Default::default()
        };
        tick(&mut state, &click, FRAME, 5000.0);
        assert_eq!(state.sweep_angle, angle);
        assert!(state.contacts.is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut a = ScopeState::new(424242, 0.0);
        let mut b = ScopeState::new(424242, 0.0);
        let click = TickInput {
            click: Some(Vec2::new(150.0, 420.0)),
            ..Default::default()
        };

        let mut now = 0.0;
        for i in 0..600 {
            now += FRAME_MS;
            let input = if i == 120 { click.clone() } else { TickInput::default() };
            tick(&mut a, &input, FRAME, now);
            tick(&mut b, &input, FRAME, now);
        }

        assert_eq!(a.contacts.len(), b.contacts.len());
        assert_eq!(a.contacts_observed, b.contacts_observed);
        assert!((a.sweep_angle - b.sweep_angle).abs() < 1e-6);
        for (ca, cb) in a.contacts.iter().zip(&b.contacts) {
            assert_eq!(ca.id, cb.id);
            assert_eq!(ca.is_target, cb.is_target);
            assert!((ca.pos - cb.pos).length() < 1e-4);
        }
    }
}
