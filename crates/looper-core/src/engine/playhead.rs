//! Fractional read position inside the active loop region

/// Playback position, direction and speed
///
/// The position is a fractional sample offset relative to the region start.
/// Wrapping adds or subtracts the region length once per step, so speeds
/// larger than the region length are not fully folded back into range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playhead {
    /// Offset from the region start in samples
    position: f32,
    /// Samples advanced per processed sample (> 0)
    speed: f32,
    /// Walk backwards through the region
    reverse: bool,
}

impl Default for Playhead {
    fn default() -> Self {
        Self {
            position: 0.0,
            speed: 1.0,
            reverse: false,
        }
    }
}

impl Playhead {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Integer sample under the playhead (truncated, negatives read as 0)
    #[inline]
    pub fn index(&self) -> usize {
        self.position as usize
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    /// Set the playback speed; non-positive or non-finite values are ignored
    pub fn set_speed(&mut self, speed: f32) -> bool {
        if speed <= 0.0 || !speed.is_finite() {
            return false;
        }
        self.speed = speed;
        true
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    /// Back to the region start
    pub fn reset(&mut self) {
        self.position = 0.0;
    }

    /// Reset to 0 unless the position lies inside `[0, length)`
    pub fn clamp_to(&mut self, length: usize) {
        if !(0.0..length as f32).contains(&self.position) {
            self.position = 0.0;
        }
    }

    /// Step by one processed sample inside a region of `length` samples
    #[inline]
    pub fn advance(&mut self, length: usize) {
        let length = length as f32;
        if self.reverse {
            self.position -= self.speed;
            if self.position < 0.0 {
                self.position += length;
            }
        } else {
            self.position += self.speed;
            if self.position >= length {
                self.position -= length;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_wraps_at_length() {
        let mut playhead = Playhead::new();
        for _ in 0..3 {
            playhead.advance(4);
        }
        assert_eq!(playhead.position(), 3.0);
        playhead.advance(4);
        assert_eq!(playhead.position(), 0.0);
    }

    #[test]
    fn test_reverse_wraps_to_last_sample() {
        let mut playhead = Playhead::new();
        playhead.set_reverse(true);
        playhead.advance(4);
        assert_eq!(playhead.position(), 3.0);
        assert_eq!(playhead.index(), 3);
    }

    #[test]
    fn test_fractional_speed() {
        let mut playhead = Playhead::new();
        assert!(playhead.set_speed(0.5));
        playhead.advance(8);
        assert_eq!(playhead.position(), 0.5);
        assert_eq!(playhead.index(), 0);
        playhead.advance(8);
        assert_eq!(playhead.index(), 1);
    }

    #[test]
    fn test_invalid_speed_ignored() {
        let mut playhead = Playhead::new();
        assert!(!playhead.set_speed(0.0));
        assert!(!playhead.set_speed(-2.0));
        assert!(!playhead.set_speed(f32::INFINITY));
        assert_eq!(playhead.speed(), 1.0);
    }

    #[test]
    fn test_single_wrap_per_step() {
        // Speeds beyond the region length under-wrap
        let mut playhead = Playhead::new();
        playhead.set_speed(10.0);
        playhead.advance(4);
        assert_eq!(playhead.position(), 6.0);
    }

    #[test]
    fn test_clamp_to_region() {
        let mut playhead = Playhead::new();
        playhead.set_speed(3.0);
        playhead.advance(10);
        playhead.clamp_to(5);
        assert_eq!(playhead.position(), 3.0);
        playhead.clamp_to(3);
        assert_eq!(playhead.position(), 0.0);
    }
}
