//! Clip playback state.

/// Playback controller for one clip of a mesh.
///
/// Time is tracked as a ratio of the clip's duration so the same player can
/// drive clips of different lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPlayer {
    clip_index: usize,
    time_ratio: f32,
    playing: bool,
    looping: bool,
    speed: f32,
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self {
            clip_index: 0,
            time_ratio: 0.0,
            playing: true,
            looping: true,
            speed: 1.0,
        }
    }
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clip(mut self, clip_index: usize) -> Self {
        self.clip_index = clip_index;
        self
    }

    #[must_use]
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    /// Switch clip and restart from the beginning.
    pub fn set_clip(&mut self, clip_index: usize) {
        self.clip_index = clip_index;
        self.time_ratio = 0.0;
    }

    pub fn time_ratio(&self) -> f32 {
        self.time_ratio
    }

    pub fn set_time_ratio(&mut self, ratio: f32) {
        self.time_ratio = ratio;
    }

    /// Current time in seconds for a clip of `duration` seconds.
    pub fn time(&self, duration: f32) -> f32 {
        self.time_ratio * duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Advance by `dt` seconds of a clip lasting `duration` seconds.
    ///
    /// Looping players wrap into `[0, 1)`, others clamp to `[0, 1]`.
    /// Zero-length clips and paused players do not advance.
    pub fn update(&mut self, dt: f32, duration: f32) {
        if !self.playing || duration <= 0.0 {
            return;
        }
        self.time_ratio += dt * self.speed / duration;
        if self.looping {
            self.time_ratio -= self.time_ratio.floor();
        } else {
            self.time_ratio = self.time_ratio.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_wraps() {
        let mut player = AnimationPlayer::new();
        player.update(1.5, 2.0);
        assert!((player.time_ratio() - 0.75).abs() < 1e-6);
        player.update(1.0, 2.0);
        assert!((player.time_ratio() - 0.25).abs() < 1e-6);
        assert!((player.time(2.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn negative_dt_wraps_backwards() {
        let mut player = AnimationPlayer::new();
        player.update(-0.5, 2.0);
        assert!((player.time_ratio() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn one_shot_clamps() {
        let mut player = AnimationPlayer::new().with_looping(false).with_speed(2.0);
        player.update(3.0, 2.0);
        assert_eq!(player.time_ratio(), 1.0);
        player.update(-10.0, 2.0);
        assert_eq!(player.time_ratio(), 0.0);
    }

    #[test]
    fn paused_and_empty_clips_do_not_advance() {
        let mut player = AnimationPlayer::new().paused();
        player.update(1.0, 2.0);
        assert_eq!(player.time_ratio(), 0.0);

        player.play();
        player.update(1.0, 0.0);
        assert_eq!(player.time_ratio(), 0.0);
    }

    #[test]
    fn set_clip_restarts() {
        let mut player = AnimationPlayer::new();
        player.update(0.5, 1.0);
        player.set_clip(3);
        assert_eq!(player.clip_index(), 3);
        assert_eq!(player.time_ratio(), 0.0);
    }
}
