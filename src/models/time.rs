use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::*;

/// Julian Date representation.
/// JD 2451545.0 = 2000-01-01 12:00:00 UTC (J2000.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct JulianDate(qtty::Days);

/// JD of the Unix epoch (1970-01-01 00:00:00 UTC).
const UNIX_EPOCH_JD: f64 = 2440587.5;

impl JulianDate {
    /// JD of the J2000.0 epoch (2000-01-01 12:00:00 UTC).
    pub const J2000_JD: f64 = 2451545.0;

    /// Create a new JD value.
    pub fn new<V: Into<qtty::Days>>(v: V) -> Self {
        Self(v.into())
    }

    /// The J2000.0 epoch.
    pub fn j2000() -> Self {
        Self::new(Self::J2000_JD)
    }

    /// Raw JD value as f64.
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Days elapsed since J2000.0 (may be negative).
    pub fn days_since_j2000(&self) -> f64 {
        self.value() - Self::J2000_JD
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.value() - UNIX_EPOCH_JD) * 86400.0
    }

    /// Create from Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn from_unix_timestamp(timestamp: f64) -> Self {
        Self::new(timestamp / 86400.0 + UNIX_EPOCH_JD)
    }

    /// Convert to chrono DateTime<Utc>.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = self.to_unix_timestamp();
        let secs_i64 = secs.floor() as i64;
        let nanos = ((secs - secs.floor()) * 1e9) as u32;
        DateTime::from_timestamp(secs_i64, nanos).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Create from chrono DateTime<Utc> using the Gregorian calendar algorithm.
    ///
    /// Dates before the Gregorian cutover (1582-10-15) follow the proleptic
    /// Gregorian calendar, a known approximation for historical dates.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let year = dt.year() as i64;
        let month = dt.month() as i64;
        let day = dt.day() as i64;

        // Fliegel-Van Flandern day number for noon of the calendar date.
        let a = (14 - month) / 12;
        let y = year + 4800 - a;
        let m = month + 12 * a - 3;
        let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;

        let seconds = dt.second() as f64 + dt.nanosecond() as f64 / 1e9;
        let day_fraction =
            (dt.hour() as f64 - 12.0) / 24.0 + dt.minute() as f64 / 1440.0 + seconds / 86400.0;

        Self::new(jdn as f64 + day_fraction)
    }
}

impl From<f64> for JulianDate {
    fn from(v: f64) -> Self {
        JulianDate::new(v)
    }
}

/// Anchor an arbitrary clock time to the noon that opens its observing night.
///
/// The night is judged in local mean solar time (longitude / 15h offset): a
/// time before local noon belongs to the night that started the previous
/// calendar day, so all downstream windows span midnight correctly.
pub fn reference_noon(date: DateTime<Utc>, longitude_deg: f64) -> DateTime<Utc> {
    let offset = Duration::seconds((longitude_deg / 15.0 * 3600.0).round() as i64);
    let local = date + offset;

    let local_day = if local.hour() < 12 {
        local
            .date_naive()
            .pred_opt()
            .unwrap_or_else(|| local.date_naive())
    } else {
        local.date_naive()
    };

    let local_noon = local_day
        .and_hms_opt(12, 0, 0)
        .unwrap_or_else(|| local.naive_utc())
        .and_utc();

    local_noon - offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_jd_new() {
        let jd = JulianDate::new(2451545.0);
        assert_eq!(jd.value(), 2451545.0);
    }

    #[test]
    fn test_jd_from_f64() {
        let jd: JulianDate = 2460000.5.into();
        assert_eq!(jd.value(), 2460000.5);
    }

    #[test]
    fn test_jd_ordering() {
        let jd1 = JulianDate::new(2451545.0);
        let jd2 = JulianDate::new(2451546.0);
        assert!(jd1 < jd2);
        assert!(jd2 > jd1);
    }

    #[test]
    fn test_j2000_epoch() {
        let dt = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        let jd = JulianDate::from_datetime(dt);
        assert!(
            (jd.value() - 2451545.0).abs() < 1e-6,
            "J2000 epoch should map to JD 2451545.0, got {}",
            jd.value()
        );
    }

    #[test]
    fn test_unix_epoch() {
        let dt = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let jd = JulianDate::from_datetime(dt);
        assert!((jd.value() - 2440587.5).abs() < 1e-6);
        assert!(jd.to_unix_timestamp().abs() < 1.0);
    }

    #[test]
    fn test_roundtrip_modern_dates() {
        let samples = [
            Utc.with_ymd_and_hms(1600, 6, 15, 3, 30, 45).unwrap(),
            Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2100, 12, 31, 0, 0, 1).unwrap(),
        ];
        for dt in samples {
            let roundtrip = JulianDate::from_datetime(dt).to_datetime();
            let delta = (roundtrip - dt).num_milliseconds().abs();
            assert!(
                delta <= 1000,
                "Round trip for {} drifted by {} ms",
                dt,
                delta
            );
        }
    }

    #[test]
    fn test_roundtrip_unix() {
        let original = JulianDate::new(2460123.456);
        let roundtrip = JulianDate::from_unix_timestamp(original.to_unix_timestamp());
        assert!((original.value() - roundtrip.value()).abs() < 1e-9);
    }

    #[test]
    fn test_days_since_j2000() {
        let jd = JulianDate::new(2451546.0);
        assert_eq!(jd.days_since_j2000(), 1.0);
    }

    #[test]
    fn test_reference_noon_afternoon_same_day() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        let noon = reference_noon(dt, 0.0);
        assert_eq!(noon, Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_reference_noon_early_morning_previous_day() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        let noon = reference_noon(dt, 0.0);
        assert_eq!(noon, Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_reference_noon_noon_boundary() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let noon = reference_noon(dt, 0.0);
        assert_eq!(noon, Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_reference_noon_uses_local_mean_time() {
        // 13:00 UTC is 03:00 local mean time at 150 degrees west, so the
        // observing night is still the one anchored the previous local day.
        let dt = Utc.with_ymd_and_hms(2026, 3, 10, 13, 0, 0).unwrap();
        let noon_west = reference_noon(dt, -150.0);
        assert_eq!(
            noon_west,
            Utc.with_ymd_and_hms(2026, 3, 9, 22, 0, 0).unwrap()
        );
    }
}
