use chrono::{DateTime, Utc};

/// Source of timestamps for measurements and warmup accounting.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// [Clock] backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C> Clock for &C
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
