//! Performance metrics for the frame loop.

use std::collections::VecDeque;
use std::time::Duration;

const WINDOW: usize = 120;

/// Tracks frame intervals and per-frame work counters.
#[derive(Debug, Clone)]
pub struct RenderMetrics {
    frame_times: VecDeque<Duration>,
    pub commands: usize,
    pub active_transitions: usize,
    pub cache_rebuilds: u64,
    pub hover_hit_tests: u64,
    pub click_hit_tests: u64,
    /// Filled in by the GPU backend.
    pub vertices: usize,
    pub draw_calls: u32,
    pub buffer_uploads: u32,
}

impl Default for RenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderMetrics {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(WINDOW),
            commands: 0,
            active_transitions: 0,
            cache_rebuilds: 0,
            hover_hit_tests: 0,
            click_hit_tests: 0,
            vertices: 0,
            draw_calls: 0,
            buffer_uploads: 0,
        }
    }

    /// Record the interval since the previous frame.
    pub fn record_frame(&mut self, dt: Duration) {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > WINDOW {
            self.frame_times.pop_front();
        }
    }

    /// Reset the per-submit GPU counters.
    pub fn begin_submit(&mut self) {
        self.vertices = 0;
        self.draw_calls = 0;
        self.buffer_uploads = 0;
    }

    pub fn record_draw_call(&mut self, vertices: usize) {
        self.draw_calls += 1;
        self.vertices += vertices;
    }

    pub fn record_buffer_upload(&mut self) {
        self.buffer_uploads += 1;
    }

    /// Average frame time in milliseconds (over the last 120 frames).
    pub fn avg_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let sum: Duration = self.frame_times.iter().sum();
        sum.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let ms = self.avg_frame_time_ms();
        if ms > 0.0 {
            1000.0 / ms
        } else {
            0.0
        }
    }

    pub fn min_frame_time_ms(&self) -> f32 {
        self.frame_times
            .iter()
            .min()
            .map(|d| d.as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }

    pub fn max_frame_time_ms(&self) -> f32 {
        self.frame_times
            .iter()
            .max()
            .map(|d| d.as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }

    pub fn last_frame_time_ms(&self) -> f32 {
        self.frame_times
            .back()
            .map(|d| d.as_secs_f32() * 1000.0)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_intervals() {
        let mut metrics = RenderMetrics::new();
        for _ in 0..10 {
            metrics.record_frame(Duration::from_millis(16));
        }
        metrics.record_frame(Duration::from_millis(24));
        assert!((metrics.last_frame_time_ms() - 24.0).abs() < 1e-3);
        assert!((metrics.min_frame_time_ms() - 16.0).abs() < 1e-3);
        assert!(metrics.fps() > 55.0 && metrics.fps() < 62.0, "FPS was {}", metrics.fps());
    }

    #[test]
    fn test_window_is_bounded() {
        let mut metrics = RenderMetrics::new();
        metrics.record_frame(Duration::from_millis(100));
        for _ in 0..WINDOW {
            metrics.record_frame(Duration::from_millis(10));
        }
        assert!((metrics.max_frame_time_ms() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_submit_counters() {
        let mut metrics = RenderMetrics::new();
        metrics.record_draw_call(300);
        metrics.record_draw_call(6);
        metrics.record_buffer_upload();
        assert_eq!((metrics.draw_calls, metrics.vertices, metrics.buffer_uploads), (2, 306, 1));
        metrics.begin_submit();
        assert_eq!(metrics.draw_calls, 0);
    }
}
