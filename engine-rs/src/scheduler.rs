//! Service-availability schedule.
//!
//! The service is open during a fixed daily window in one reference
//! timezone unless an admin override forces it open or closed. Evaluation is
//! a pure function of the current instant; the engine re-runs it on a timer.

use chrono::{DateTime, Days, FixedOffset, NaiveTime, Offset, Timelike, Utc};
use serde::Serialize;

use crate::config::ScheduleConfig;
use crate::models::SystemOverride;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub status: ServiceStatus,
    /// Set only when closed by the schedule itself.
    pub next_opening: Option<DateTime<FixedOffset>>,
}

impl Availability {
    pub fn is_online(&self) -> bool {
        self.status == ServiceStatus::Online
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OpeningWindow {
    offset: FixedOffset,
    open_hour: u32,
    close_hour: u32,
}

impl OpeningWindow {
    pub fn new(offset: FixedOffset, open_hour: u32, close_hour: u32) -> Self {
        Self {
            offset,
            open_hour,
            close_hour,
        }
    }

    pub fn from_config(cfg: &ScheduleConfig) -> Self {
        let offset = FixedOffset::east_opt(cfg.utc_offset_minutes * 60).unwrap_or_else(|| {
            tracing::warn!(
                minutes = cfg.utc_offset_minutes,
                "invalid schedule offset; using UTC"
            );
            Utc.fix()
        });
        Self::new(offset, cfg.open_hour, cfg.close_hour)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    fn next_opening(&self, local: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let day = if local.hour() < self.open_hour {
            local.date_naive()
        } else {
            local.date_naive().checked_add_days(Days::new(1))?
        };
        let open = NaiveTime::from_hms_opt(self.open_hour, 0, 0)?;
        day.and_time(open).and_local_timezone(self.offset).single()
    }
}

pub fn evaluate(now: DateTime<Utc>, mode: SystemOverride, window: &OpeningWindow) -> Availability {
    match mode {
        SystemOverride::Online => Availability {
            status: ServiceStatus::Online,
            next_opening: None,
        },
        SystemOverride::Offline => Availability {
            status: ServiceStatus::Offline,
            next_opening: None,
        },
        SystemOverride::Auto => {
            let local = now.with_timezone(&window.offset);
            let hour = local.hour();
            if hour >= window.open_hour && hour < window.close_hour {
                Availability {
                    status: ServiceStatus::Online,
                    next_opening: None,
                }
            } else {
                Availability {
                    status: ServiceStatus::Offline,
                    next_opening: window.next_opening(local),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn nepal() -> OpeningWindow {
        OpeningWindow::new(FixedOffset::east_opt(345 * 60).unwrap(), 10, 17)
    }

    fn at_local(h: u32, m: u32) -> DateTime<Utc> {
        nepal()
            .offset()
            .with_ymd_and_hms(2025, 6, 10, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn early_morning_opens_same_day() {
        let a = evaluate(at_local(9, 30), SystemOverride::Auto, &nepal());
        assert_eq!(a.status, ServiceStatus::Offline);
        let next = a.next_opening.unwrap();
        assert_eq!(next, nepal().offset().with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap());
    }

    #[test]
    fn evening_opens_next_day() {
        let a = evaluate(at_local(18, 0), SystemOverride::Auto, &nepal());
        assert_eq!(a.status, ServiceStatus::Offline);
        let next = a.next_opening.unwrap();
        assert_eq!(next, nepal().offset().with_ymd_and_hms(2025, 6, 11, 10, 0, 0).unwrap());
    }

    #[test]
    fn window_bounds_are_half_open() {
        assert!(evaluate(at_local(10, 0), SystemOverride::Auto, &nepal()).is_online());
        assert!(evaluate(at_local(16, 59), SystemOverride::Auto, &nepal()).is_online());
        assert!(!evaluate(at_local(17, 0), SystemOverride::Auto, &nepal()).is_online());
    }

    #[test]
    fn uses_reference_zone_not_utc() {
        // 04:30 UTC is 10:15 in Nepal
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 4, 30, 0).unwrap();
        assert!(evaluate(now, SystemOverride::Auto, &nepal()).is_online());
    }

    #[test]
    fn overrides_win_over_clock() {
        let night = at_local(23, 0);
        let forced = evaluate(night, SystemOverride::Online, &nepal());
        assert!(forced.is_online());

        let noon = at_local(12, 0);
        let closed = evaluate(noon, SystemOverride::Offline, &nepal());
        assert_eq!(closed.status, ServiceStatus::Offline);
        assert!(closed.next_opening.is_none());
    }

    #[test]
    fn month_end_rolls_over() {
        let now = nepal()
            .offset()
            .with_ymd_and_hms(2025, 6, 30, 20, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next = evaluate(now, SystemOverride::Auto, &nepal()).next_opening.unwrap();
        assert_eq!(next, nepal().offset().with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap());
    }
}
