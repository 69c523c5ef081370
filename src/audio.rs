//! Audio system using the Web Audio API
//!
//! Procedurally generated sonar pings and the explosion - no sample files.
//! The context is created lazily on the first user gesture (browsers refuse
//! audio graphs before one); every play call before that is a silent no-op.

use web_sys::{
    AudioBuffer, AudioContext, BiquadFilterType, OscillatorType,
};

/// Audio manager for the scope
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    /// Uninitialized manager; call [`init`](Self::init) from a gesture handler.
    pub fn new() -> Self {
        Self {
            ctx: None,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Create the audio context. Safe to call repeatedly; only the first
    /// qualifying call does anything.
    pub fn init(&mut self) {
        if self.ctx.is_some() {
            return;
        }
        self.ctx = AudioContext::new().ok();
        if self.ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        } else {
            log::info!("Audio initialized");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sonar ping. Fire-and-forget; no-op before initialization.
    pub fn play_ping(&self, frequency: f32, duration_ms: f64, volume: f32) {
        let scale = self.effective_volume();
        if scale <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        PingSpec {
            frequency,
            duration_ms,
            volume: volume * scale,
        }
        .play(ctx);
    }

    /// Layered explosion: low rumble + high crack + noise burst.
    pub fn play_explosion(&self) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        let t = ctx.current_time();

        // Pitch-dropping low rumble
        if let (Ok(osc), Ok(gain)) = (ctx.create_oscillator(), ctx.create_gain()) {
            osc.set_type(OscillatorType::Sawtooth);
            osc.frequency().set_value_at_time(30.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(15.0, t + 2.0)
                .ok();
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + 2.0)
                .ok();
            if osc.connect_with_audio_node(&gain).is_ok()
                && gain.connect_with_audio_node(&ctx.destination()).is_ok()
            {
                osc.start().ok();
                osc.stop_with_when(t + 2.0).ok();
            }
        }

        // High frequency crack
        if let (Ok(osc), Ok(gain)) = (ctx.create_oscillator(), ctx.create_gain()) {
            osc.set_type(OscillatorType::Square);
            osc.frequency().set_value_at_time(2000.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(100.0, t + 0.3)
                .ok();
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + 0.3)
                .ok();
            if osc.connect_with_audio_node(&gain).is_ok()
                && gain.connect_with_audio_node(&ctx.destination()).is_ok()
            {
                osc.start().ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }

        // Filtered white-noise burst
        let Some(buffer) = noise_buffer(ctx, 0.5) else { return };
        let (Ok(source), Ok(gain)) = (ctx.create_buffer_source(), ctx.create_gain()) else {
            return;
        };
        source.set_buffer(Some(&buffer));
        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + 0.5)
            .ok();
        if source.connect_with_audio_node(&gain).is_ok()
            && gain.connect_with_audio_node(&ctx.destination()).is_ok()
        {
            source.start().ok();
        }
    }
}

/// One disposable ping graph: dual oscillators into band/low-pass shaping,
/// split dry/wet through a convolution reverb, with a linear-attack,
/// exponential-decay envelope. Every node is short-lived; the browser
/// garbage-collects the graph once the oscillators stop.
struct PingSpec {
    frequency: f32,
    duration_ms: f64,
    volume: f32,
}

impl PingSpec {
    fn play(&self, ctx: &AudioContext) {
        let now = ctx.current_time();
        let total = self.duration_ms / 1000.0;
        let freq = self.frequency;

        let Ok(main_osc) = ctx.create_oscillator() else { return };
        let Ok(sub_osc) = ctx.create_oscillator() else { return };
        let Ok(main_gain) = ctx.create_gain() else { return };
        let Ok(sub_gain) = ctx.create_gain() else { return };
        let Ok(master_gain) = ctx.create_gain() else { return };
        let Ok(dry_gain) = ctx.create_gain() else { return };
        let Ok(reverb_gain) = ctx.create_gain() else { return };
        let Ok(lowpass) = ctx.create_biquad_filter() else { return };
        let Ok(bandpass) = ctx.create_biquad_filter() else { return };
        let Ok(convolver) = ctx.create_convolver() else { return };

        // Underwater-ish impulse: 2s of decaying noise
        let Some(impulse) = impulse_response(ctx, 2.0, 3.0) else { return };
        convolver.set_buffer(Some(&impulse));

        main_osc.set_type(OscillatorType::Sine);
        main_osc.frequency().set_value_at_time(freq, now).ok();
        sub_osc.set_type(OscillatorType::Sine);
        sub_osc.frequency().set_value_at_time(freq * 0.6, now).ok();

        lowpass.set_type(BiquadFilterType::Lowpass);
        lowpass.frequency().set_value_at_time(1200.0, now).ok();
        lowpass.q().set_value_at_time(2.0, now).ok();
        bandpass.set_type(BiquadFilterType::Bandpass);
        bandpass.frequency().set_value_at_time(freq * 1.2, now).ok();
        bandpass.q().set_value_at_time(15.0, now).ok();

        // main -> bandpass, sub -> lowpass, both -> master -> dry + wet
        let wired = main_osc.connect_with_audio_node(&main_gain).is_ok()
            && sub_osc.connect_with_audio_node(&sub_gain).is_ok()
            && main_gain.connect_with_audio_node(&bandpass).is_ok()
            && sub_gain.connect_with_audio_node(&lowpass).is_ok()
            && bandpass.connect_with_audio_node(&master_gain).is_ok()
            && lowpass.connect_with_audio_node(&master_gain).is_ok()
            && master_gain.connect_with_audio_node(&dry_gain).is_ok()
            && master_gain.connect_with_audio_node(&convolver).is_ok()
            && convolver.connect_with_audio_node(&reverb_gain).is_ok()
            && dry_gain.connect_with_audio_node(&ctx.destination()).is_ok()
            && reverb_gain.connect_with_audio_node(&ctx.destination()).is_ok();
        if !wired {
            return;
        }

        main_gain.gain().set_value_at_time(0.7, now).ok();
        sub_gain.gain().set_value_at_time(0.3, now).ok();
        dry_gain.gain().set_value_at_time(0.4, now).ok();
        reverb_gain.gain().set_value_at_time(0.6, now).ok();

        // Sharp attack, brief peak, long exponential tail
        let vol = self.volume;
        master_gain.gain().set_value_at_time(0.0, now).ok();
        master_gain
            .gain()
            .linear_ramp_to_value_at_time(vol * 1.2, now + 0.001)
            .ok();
        master_gain
            .gain()
            .exponential_ramp_to_value_at_time(vol.max(0.001), now + total * 0.1)
            .ok();
        master_gain
            .gain()
            .exponential_ramp_to_value_at_time(0.001, now + total * 0.9)
            .ok();

        // Downward sweeps: doppler/distance feel
        main_osc
            .frequency()
            .exponential_ramp_to_value_at_time(freq * 0.75, now + total)
            .ok();
        sub_osc
            .frequency()
            .exponential_ramp_to_value_at_time(freq * 0.6 * 0.75, now + total)
            .ok();
        lowpass
            .frequency()
            .exponential_ramp_to_value_at_time(400.0, now + total)
            .ok();
        bandpass
            .frequency()
            .exponential_ramp_to_value_at_time(freq * 0.8, now + total)
            .ok();

        main_osc.start().ok();
        sub_osc.start().ok();
        main_osc.stop_with_when(now + total).ok();
        sub_osc.stop_with_when(now + total).ok();
    }
}

/// Stereo decaying-noise impulse response for the convolution reverb
fn impulse_response(ctx: &AudioContext, duration_secs: f32, decay: f32) -> Option<AudioBuffer> {
    let sample_rate = ctx.sample_rate();
    let length = (sample_rate * duration_secs) as u32;
    let buffer = ctx.create_buffer(2, length, sample_rate).ok()?;

    let mut data = vec![0.0f32; length as usize];
    for channel in 0..2 {
        for (i, sample) in data.iter_mut().enumerate() {
            let remaining = (length as usize - i) as f32 / length as f32;
            *sample = (js_sys::Math::random() as f32 * 2.0 - 1.0) * remaining.powf(decay);
        }
        buffer.copy_to_channel(&mut data, channel).ok()?;
    }
    Some(buffer)
}

/// Flat white-noise buffer for the explosion burst
fn noise_buffer(ctx: &AudioContext, duration_secs: f32) -> Option<AudioBuffer> {
    let sample_rate = ctx.sample_rate();
    let length = (sample_rate * duration_secs) as u32;
    let buffer = ctx.create_buffer(1, length, sample_rate).ok()?;

    let mut data = vec![0.0f32; length as usize];
    for sample in data.iter_mut() {
        *sample = js_sys::Math::random() as f32 * 2.0 - 1.0;
    }
    buffer.copy_to_channel(&mut data, 0).ok()?;
    Some(buffer)
}
