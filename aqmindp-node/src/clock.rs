/// Monotonic millisecond clock used to pace the sampling cycle
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Fires once per `interval_ms`. The first check is always due.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    interval_ms: u64,
    last: Option<u64>,
}

impl Interval {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last: None,
        }
    }

    pub fn due(&mut self, now_ms: u64) -> bool {
        match self.last {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last = Some(now_ms);
                true
            }
        }
    }
}
