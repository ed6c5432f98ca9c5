/// DS3231 real-time clock
use log::{info, warn};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::error::SensorError;
use crate::sensors::PlatformHandle;

/// Calendar fields as held by the RTC. `weekday` is 1 = Monday .. 7 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RtcDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RtcDateTime {
    /// Build from calendar fields, validating them and deriving the weekday
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, SensorError> {
        let fields = RtcDateTime {
            year,
            month,
            day,
            weekday: 0,
            hour,
            minute,
            second,
        };
        Ok(Self::from_datetime(fields.to_datetime()?))
    }

    pub fn from_datetime(dt: PrimitiveDateTime) -> Self {
        RtcDateTime {
            year: dt.year().clamp(0, u16::MAX as i32) as u16,
            month: dt.month() as u8,
            day: dt.day(),
            weekday: dt.weekday().number_from_monday(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// Calendar fields as a date-time; the stored weekday is ignored
    pub fn to_datetime(&self) -> Result<PrimitiveDateTime, SensorError> {
        let month = Month::try_from(self.month).map_err(invalid)?;
        let date = Date::from_calendar_date(self.year as i32, month, self.day).map_err(invalid)?;
        let time = Time::from_hms(self.hour, self.minute, self.second).map_err(invalid)?;
        Ok(PrimitiveDateTime::new(date, time))
    }

    /// `YYYY/MM/DD` as stamped into packets
    pub fn date_string(&self) -> String {
        format!("{}/{:02}/{:02}", self.year, self.month, self.day)
    }

    /// `HH:MM:SS` as stamped into packets
    pub fn time_string(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }

    /// `YYYYMMDD_HHMMSS`, used to name log files
    pub fn file_stamp(&self) -> String {
        format!(
            "{:04}{:02}{:02}_{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn invalid(e: time::error::ComponentRange) -> SensorError {
    SensorError::InvalidDateTime(e.to_string())
}

pub struct RtcClock {
    platform: PlatformHandle,
}

impl RtcClock {
    pub fn new(platform: PlatformHandle) -> Self {
        Self { platform }
    }

    pub fn try_read(&mut self) -> Result<RtcDateTime, SensorError> {
        self.platform.with(|p| p.rtc_datetime())
    }

    /// Current time; a fault yields the all-zero date
    pub fn read(&mut self) -> RtcDateTime {
        self.try_read().unwrap_or_else(|e| {
            warn!("RTC read failed, reporting zeros: {}", e);
            RtcDateTime::default()
        })
    }

    /// Write the clock and clear the oscillator-stop flag
    pub fn set_time(
        &mut self,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<(), SensorError> {
        let datetime = RtcDateTime::new(year, month, day, hour, minute, second)?;
        self.platform.with(|p| {
            p.set_rtc_datetime(&datetime)?;
            p.clear_oscillator_fault()
        })?;
        info!(
            "RTC set to {} {}",
            datetime.date_string(),
            datetime.time_string()
        );
        Ok(())
    }

    /// Set the clock from a UTC instant shifted by a whole-hour offset
    pub fn sync_from(
        &mut self,
        now_utc: OffsetDateTime,
        offset_hours: i8,
    ) -> Result<(), SensorError> {
        let local = now_utc + time::Duration::hours(offset_hours as i64);
        let dt = RtcDateTime::from_datetime(PrimitiveDateTime::new(local.date(), local.time()));
        self.set_time(dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second)
    }
}
