/// Polled, time-limited job
///
/// Advanced once per tick with the frame's elapsed time; reports `Finished`
/// on the first poll where the elapsed time exceeds the duration.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Continue,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedTask {
    elapsed: f32,
    duration: f32,
}

impl TimedTask {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
        }
    }

    pub fn poll(&mut self, delta_time: f32) -> TaskStatus {
        self.elapsed += delta_time.max(0.0);
        if self.elapsed > self.duration {
            TaskStatus::Finished
        } else {
            TaskStatus::Continue
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}
