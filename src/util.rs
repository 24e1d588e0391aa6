//! Shared utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// True for 1, 2, 4, 8, ... (zero is not a power of two)
#[inline]
pub fn is_pow2(v: u32) -> bool {
    v != 0 && v & (v - 1) == 0
}

// ============================================================================
// Frame Clock
// ============================================================================

/// Timestamps every presented frame
///
/// The backend stamps it at the end of `draw_end`; whoever paces the game
/// loop reads the last present instant and the rolling frame time from here.
pub struct FrameClock {
    frame_times: VecDeque<f32>,
    last_present: Option<Instant>,
    last_delta: Duration,
    frames: u64,
    sample_count: usize,
}

impl FrameClock {
    /// Create a clock averaging over the last `sample_count` frames
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_present: None,
            last_delta: Duration::ZERO,
            frames: 0,
            sample_count: sample_count.max(1),
        }
    }

    /// Record a presented frame at `now`
    pub fn stamp(&mut self, now: Instant) {
        if let Some(last) = self.last_present {
            self.last_delta = now.saturating_duration_since(last);
            self.frame_times.push_back(self.last_delta.as_secs_f32());
            if self.frame_times.len() > self.sample_count {
                self.frame_times.pop_front();
            }
        }
        self.last_present = Some(now);
        self.frames += 1;
    }

    /// Instant of the last presented frame, if any
    pub fn last_present(&self) -> Option<Instant> {
        self.last_present
    }

    /// Time between the last two presented frames
    pub fn last_delta(&self) -> Duration {
        self.last_delta
    }

    /// Total number of presented frames
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Average fps over the sample window (0 until two frames were stamped)
    pub fn average_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let avg_dt = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        if avg_dt > 0.0 {
            1.0 / avg_dt
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pow2() {
        assert!(!is_pow2(0));
        assert!(is_pow2(1));
        assert!(is_pow2(2));
        assert!(!is_pow2(3));
        assert!(is_pow2(256));
        assert!(!is_pow2(320));
        assert!(is_pow2(1 << 31));
    }

    #[test]
    fn test_frame_clock_deltas() {
        let mut clock = FrameClock::new(4);
        let t0 = Instant::now();
        assert!(clock.last_present().is_none());
        assert_eq!(clock.average_fps(), 0.0);

        clock.stamp(t0);
        clock.stamp(t0 + Duration::from_millis(20));
        clock.stamp(t0 + Duration::from_millis(40));

        assert_eq!(clock.frame_count(), 3);
        assert_eq!(clock.last_delta(), Duration::from_millis(20));
        assert_eq!(clock.last_present(), Some(t0 + Duration::from_millis(40)));
        assert!((clock.average_fps() - 50.0).abs() < 0.5);
    }
}
