use chrono::{DateTime, FixedOffset, Local, NaiveTime, Utc};
use chrono_tz::Tz;

/// Daily time-of-day interval during which replies may be sent.
///
/// When `start > end` the window spans midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ReplyWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }

    pub fn contains_instant(&self, now: &DateTime<FixedOffset>) -> bool {
        self.contains(now.time())
    }
}

/// Current wall-clock time in `timezone`, or the system local zone when unset.
pub fn current_local_time(timezone: Option<Tz>) -> DateTime<FixedOffset> {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
        None => Local::now().fixed_offset(),
    }
}
