//! Adaptive streaming-watermark controller
//!
//! Runs once per timer period (~16 ms on the reference board). The level is
//! the streaming FIFO's commit threshold: small levels commit packets
//! quickly (low latency when the host polls slowly), large levels send
//! fuller packets (less per-transfer overhead when the host saturates the
//! link). The policy is asymmetric and hysteretic so a borderline transfer
//! rate does not make the level hunt.

use crate::hal::Hal;

/// Hardware maximum commit threshold (one full bulk packet)
pub const WATERMARK_MAX: u16 = 512;
/// Smallest useful commit threshold
pub const WATERMARK_MIN: u16 = 1;
/// Threshold applied when the streaming endpoint is (re)configured
pub const DEFAULT_COMMIT_THRESHOLD: u16 = WATERMARK_MAX;

/// Samples per tick above which the level doubles
pub const INC_THRESHOLD: u8 = 2;
/// Samples per tick above which the level doubles twice (fast ramp-up)
pub const MAX_THRESHOLD: u8 = 8;
/// Samples per tick below which the level halves
pub const DEC_THRESHOLD: u8 = 1;

/// Owner of the watermark level. Mutated only on the periodic tick.
#[derive(Debug)]
pub struct Watermark {
    level: u16,
}

impl Default for Watermark {
    fn default() -> Self {
        Self::new()
    }
}

impl Watermark {
    /// A controller at the default threshold.
    pub fn new() -> Self {
        Self {
            level: DEFAULT_COMMIT_THRESHOLD,
        }
    }

    /// Current level. Always a power of two in `[WATERMARK_MIN, WATERMARK_MAX]`.
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Re-align with the hardware default after endpoint reconfiguration.
    pub fn reset(&mut self) {
        self.level = DEFAULT_COMMIT_THRESHOLD;
    }

    /// Apply the adjustment policy to one tick's sample.
    ///
    /// Returns the new level if it changed, `None` inside the deadband.
    pub fn adjust(&mut self, sample: u8) -> Option<u16> {
        let old = self.level;
        if sample > INC_THRESHOLD {
            self.level = (self.level << 1).min(WATERMARK_MAX);
            if sample > MAX_THRESHOLD {
                self.level = (self.level << 1).min(WATERMARK_MAX);
            }
        } else if sample < DEC_THRESHOLD && self.level > WATERMARK_MIN {
            self.level >>= 1;
        }
        (self.level != old).then_some(self.level)
    }

    /// One timer tick: adjust for `sample` completion events and, on a
    /// change, program the hardware threshold register.
    pub fn on_tick<H: Hal>(&mut self, hal: &mut H, sample: u8) {
        let old = self.level;
        if let Some(level) = self.adjust(sample) {
            log::trace!("watermark {} -> {} (sample {})", old, level, sample);
            hal.set_commit_threshold(level);
        }
    }
}
