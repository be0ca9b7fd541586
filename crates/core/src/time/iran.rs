use anyhow::Context;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc, Weekday};

// Iran Standard Time. Daylight saving was abolished in 2022.
const IRST_OFFSET_SECS: i32 = 3 * 3600 + 30 * 60;

const MONTH_NAMES: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

// Cumulative day counts before each Gregorian month (non-leap year).
const GREGORIAN_DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl JalaliDate {
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).saturating_sub(1).min(11)]
    }
}

/// Date stamps embedded in every provider prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInfo {
    /// Tehran calendar date.
    pub date: NaiveDate,
    /// Long Solar Hijri form, e.g. `جمعه ۲۴ مهر ۱۴۰۵`.
    pub shamsi: String,
    /// Gregorian reference, e.g. `Fri Oct 16 2026`.
    pub gregorian: String,
}

impl DateInfo {
    pub fn now() -> anyhow::Result<Self> {
        Self::at(Utc::now())
    }

    pub fn at(now_utc: DateTime<Utc>) -> anyhow::Result<Self> {
        let date = tehran_date(now_utc)?;
        let jalali = gregorian_to_jalali(date);

        let shamsi = format!(
            "{} {} {} {}",
            weekday_name(date.weekday()),
            to_persian_digits(&jalali.day.to_string()),
            jalali.month_name(),
            to_persian_digits(&jalali.year.to_string()),
        );
        let gregorian = date.format("%a %b %d %Y").to_string();

        Ok(Self {
            date,
            shamsi,
            gregorian,
        })
    }
}

pub fn tehran_date(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let irst = FixedOffset::east_opt(IRST_OFFSET_SECS).context("invalid IRST offset")?;
    Ok(now_utc.with_timezone(&irst).date_naive())
}

pub fn gregorian_to_jalali(date: NaiveDate) -> JalaliDate {
    let gy = date.year() as i64;
    let gm = date.month() as i64;
    let gd = date.day() as i64;

    let gy2 = if gm > 2 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
        + gd
        + GREGORIAN_DAYS_BEFORE_MONTH[(gm - 1) as usize];

    // 33-year cycles, then 4-year cycles.
    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    JalaliDate {
        year: jy as i32,
        month: jm as u32,
        day: jd as u32,
    }
}

pub fn to_persian_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32('۰' as u32 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn nowruz_boundaries() {
        assert_eq!(
            gregorian_to_jalali(ymd(2024, 3, 20)),
            JalaliDate { year: 1403, month: 1, day: 1 }
        );
        assert_eq!(
            gregorian_to_jalali(ymd(2024, 3, 19)),
            JalaliDate { year: 1402, month: 12, day: 29 }
        );
        // 1403 is a leap year: Esfand has 30 days.
        assert_eq!(
            gregorian_to_jalali(ymd(2025, 3, 20)),
            JalaliDate { year: 1403, month: 12, day: 30 }
        );
        assert_eq!(
            gregorian_to_jalali(ymd(2025, 3, 21)),
            JalaliDate { year: 1404, month: 1, day: 1 }
        );
    }

    #[test]
    fn second_half_of_year_uses_thirty_day_months() {
        let j = gregorian_to_jalali(ymd(2026, 10, 16));
        assert_eq!(j, JalaliDate { year: 1405, month: 7, day: 24 });
        assert_eq!(j.month_name(), "مهر");
    }

    #[test]
    fn date_info_formats_both_calendars() {
        // 12:00 UTC = 15:30 IRST, same day.
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let info = DateInfo::at(now).unwrap();
        assert_eq!(info.date, ymd(2026, 10, 16));
        assert_eq!(info.shamsi, "جمعه ۲۴ مهر ۱۴۰۵");
        assert_eq!(info.gregorian, "Fri Oct 16 2026");
    }

    #[test]
    fn late_utc_evening_is_next_day_in_tehran() {
        // 21:00 UTC = 00:30 IRST on the 17th.
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 21, 0, 0).unwrap();
        let info = DateInfo::at(now).unwrap();
        assert_eq!(info.date, ymd(2026, 10, 17));
        assert!(info.shamsi.starts_with("شنبه"));
    }

    #[test]
    fn persian_digits_leave_other_chars_alone() {
        assert_eq!(to_persian_digits("1405/07-24"), "۱۴۰۵/۰۷-۲۴");
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sat => "شنبه",
        Weekday::Sun => "یکشنبه",
        Weekday::Mon => "دوشنبه",
        Weekday::Tue => "سه‌شنبه",
        Weekday::Wed => "چهارشنبه",
        Weekday::Thu => "پنجشنبه",
        Weekday::Fri => "جمعه",
    }
}
