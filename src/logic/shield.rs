//! Noise Shield
//!
//! Passive degradation layer: per-frame parameters for an imperceptible
//! noise plane that corrupts codec prediction in captured video while
//! staying invisible to the viewer. This module only generates the frame
//! descriptions; rendering them is the overlay sink's concern.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::host::OverlaySink;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Resting opacity of the noise plane
const BASE_ALPHA: f32 = 0.001;

/// Amplitude of the temporal alpha oscillation
const ALPHA_WOBBLE: f32 = 0.0001;

/// Dither spots are injected every Nth frame
const DITHER_EVERY: u64 = 3;

/// Spots per dither injection
const DITHER_SPOTS: usize = 100;

/// Maximum dither spot edge (pixels)
const DITHER_MAX_SIZE: f32 = 5.0;

/// Chroma noise refreshes every Nth frame
const CHROMA_EVERY: u64 = 5;

/// Amplitude of the contrast modulation
const CONTRAST_WOBBLE: f32 = 0.01;

// ============================================================================
// FRAME DESCRIPTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DitherSpot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Everything a renderer needs to composite one shield frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseFrame {
    pub frame: u64,
    /// Plane opacity, oscillating just above imperceptible
    pub alpha: f32,
    /// Tint hue in degrees, walking the full wheel
    pub tint_hue: f32,
    /// Dither spots for this frame; empty off-cadence
    pub dither: Vec<DitherSpot>,
    /// Regenerate the chroma noise plane this frame
    pub refresh_chroma: bool,
    /// Single-column scanline color derived from the frame counter
    pub scanline_rgb: [u8; 3],
    /// Contrast filter factor
    pub contrast: f32,
}

// ============================================================================
// GENERATOR
// ============================================================================

pub struct NoiseShield {
    frame: u64,
    viewport_width: u32,
    viewport_height: u32,
    rng: StdRng,
}

impl NoiseShield {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            frame: 0,
            viewport_width,
            viewport_height,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor for reproducible frame streams
    pub fn with_seed(viewport_width: u32, viewport_height: u32, seed: u64) -> Self {
        Self {
            frame: 0,
            viewport_width,
            viewport_height,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance one frame and describe its noise layers
    pub fn next_frame(&mut self) -> NoiseFrame {
        self.frame += 1;
        let phase = self.frame as f32;

        let dither = if self.frame % DITHER_EVERY == 0 {
            (0..DITHER_SPOTS)
                .map(|_| DitherSpot {
                    x: self.rng.gen::<f32>() * self.viewport_width as f32,
                    y: self.rng.gen::<f32>() * self.viewport_height as f32,
                    size: self.rng.gen::<f32>() * DITHER_MAX_SIZE,
                })
                .collect()
        } else {
            Vec::new()
        };

        NoiseFrame {
            frame: self.frame,
            alpha: BASE_ALPHA + (phase * 0.001).sin() * ALPHA_WOBBLE,
            tint_hue: (self.frame % 360) as f32,
            dither,
            refresh_chroma: self.frame % CHROMA_EVERY == 0,
            scanline_rgb: [
                (self.frame % 256) as u8,
                ((self.frame * 2) % 256) as u8,
                ((self.frame * 3) % 256) as u8,
            ],
            contrast: 1.0 + (phase * 0.001).sin() * CONTRAST_WOBBLE,
        }
    }

    /// Grayscale RGBA noise plane at minimum alpha, regenerated on chroma
    /// frames
    pub fn noise_plane(&mut self, width: u32, height: u32) -> Vec<u8> {
        let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
        for pixel in data.chunks_exact_mut(4) {
            let value: u8 = self.rng.gen();
            pixel[0] = value;
            pixel[1] = value;
            pixel[2] = value;
            pixel[3] = 1;
        }
        data
    }

    /// Drive the shield against a sink at a fixed frame rate until the task
    /// is aborted
    pub async fn run(mut self, sink: Arc<dyn OverlaySink>, fps: u32) {
        let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        let mut ticker = tokio::time::interval(period);
        log::info!("🛡️ noise shield active ({} fps)", fps);

        loop {
            ticker.tick().await;
            let frame = self.next_frame();
            sink.apply_noise(&frame);
        }
    }
}
