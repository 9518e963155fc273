//! Side-effect-only tick observers.
//!
//! Observers receive a read-only [`TickReport`] after each tick and must not
//! mutate the matrix. This is separate from the mandatory per-player delta
//! view (`crate::view`), which is a first-class return value of the tick
//! loop rather than an optional side channel.

use crate::step::TickReport;

pub trait TickObserver {
    fn on_tick(&mut self, report: &TickReport);

    fn name(&self) -> &str {
        "TickObserver"
    }
}

/// Prints a one-line per-tick summary through the `log` facade.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    pub every: u64,
}

impl ConsoleObserver {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl TickObserver for ConsoleObserver {
    fn on_tick(&mut self, report: &TickReport) {
        if report.tick % self.every != 0 {
            return;
        }
        log::info!(
            "tick {}: {} flips, {} nations defeated this tick, {:.2}ms",
            report.tick,
            report.total_flips,
            report.newly_defeated.len(),
            report.elapsed.as_secs_f64() * 1000.0,
        );
    }
}

#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn TickObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Box<dyn TickObserver>) {
        log::debug!("registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    pub fn notify(&mut self, report: &TickReport) {
        for observer in &mut self.observers {
            observer.on_tick(report);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
