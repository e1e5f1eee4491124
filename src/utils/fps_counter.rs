//! 帧率统计：按时间窗口计帧，窗口关闭时报告平均 FPS。

use std::time::{Duration, Instant};

/// Counts frames over a fixed window and reports the average when the
/// window closes. Between reports the last average stays readable, so a
/// title bar does not flicker back to zero.
pub struct FpsCounter {
    window: Duration,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    /// Counter with the standard one-second window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    /// Counter with a custom reporting window.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    /// Call once per frame. Returns the fresh average whenever the window
    /// has elapsed, `None` otherwise.
    pub fn update(&mut self) -> Option<f32> {
        self.frames += 1;

        let elapsed = self.window_start.elapsed();
        if elapsed < self.window {
            return None;
        }

        self.fps = self.frames as f32 / elapsed.as_secs_f32().max(f32::EPSILON);
        self.frames = 0;
        self.window_start = Instant::now();
        Some(self.fps)
    }

    /// Last reported average; zero until the first window closes.
    #[inline]
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Per-frame window-title helper: counts this frame and, when a window
    /// just closed, returns `"{base} | N FPS"` for `Window::set_title`.
    pub fn title(&mut self, base: &str) -> Option<String> {
        self.update().map(|fps| format!("{base} | {fps:.0} FPS"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_nothing_before_the_window_closes() {
        let mut counter = FpsCounter::new();
        assert_eq!(counter.update(), None);
        assert_eq!(counter.fps(), 0.0);
    }

    #[test]
    fn zero_window_reports_every_frame() {
        let mut counter = FpsCounter::with_window(Duration::ZERO);
        assert!(counter.update().is_some());
        assert!(counter.update().is_some());
        assert!(counter.fps() > 0.0);
    }

    #[test]
    fn title_carries_the_base_name() {
        let mut counter = FpsCounter::with_window(Duration::ZERO);
        let title = counter.title("Demo").unwrap();
        assert!(title.starts_with("Demo | "));
        assert!(title.ends_with(" FPS"));
    }
}
