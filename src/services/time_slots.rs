use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

use crate::config::BusinessHours;

const TOKYO_OFFSET_HOURS: i64 = 9;
const WEEKDAY_LABELS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];

// All reservation times are expressed in UTC+9 regardless of the host timezone
pub fn to_tokyo_local(now: DateTime<Utc>) -> NaiveDateTime {
    now.naive_utc() + Duration::hours(TOKYO_OFFSET_HOURS)
}

pub fn today_in_tokyo(now: DateTime<Utc>) -> NaiveDate {
    to_tokyo_local(now).date()
}

// Render a wall-clock time as "YYYY-MM-DDTHH:MM:SS+09:00"
pub fn format_tokyo_timestamp(local: NaiveDateTime) -> String {
    format!("{}+09:00", local.format("%Y-%m-%dT%H:%M:%S"))
}

pub fn format_instant(now: DateTime<Utc>) -> String {
    format_tokyo_timestamp(to_tokyo_local(now))
}

/// A date card in the selectable window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableDate {
    pub date: NaiveDate,
    pub offset_days: u32,
    pub relative_label: Option<&'static str>,
    pub weekday_label: &'static str,
}

pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAY_LABELS[date.weekday().num_days_from_monday() as usize]
}

fn relative_label(offset_days: u32) -> Option<&'static str> {
    match offset_days {
        0 => Some("今日"),
        1 => Some("明日"),
        2 => Some("明後日"),
        _ => None,
    }
}

pub fn selectable_dates(today: NaiveDate, available_days: u32) -> Vec<SelectableDate> {
    (0..available_days)
        .filter_map(|offset| {
            today
                .checked_add_signed(Duration::days(offset as i64))
                .map(|date| SelectableDate {
                    date,
                    offset_days: offset,
                    relative_label: relative_label(offset),
                    weekday_label: weekday_label(date),
                })
        })
        .collect()
}

pub fn is_within_window(date: NaiveDate, today: NaiveDate, available_days: u32) -> bool {
    let offset = (date - today).num_days();
    offset >= 0 && offset < available_days as i64
}

// Slots start at start_hour and step by interval while strictly before end_hour
pub fn time_slots(hours: &BusinessHours) -> Vec<NaiveTime> {
    if hours.interval == 0 {
        return Vec::new();
    }

    let start = hours.start_hour.saturating_mul(60);
    let end = hours.end_hour.min(24) * 60;

    let slots: Vec<NaiveTime> = (start..end)
        .step_by(hours.interval as usize)
        .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
        .collect();

    debug!(
        "Generated {} time slots between {}:00 and {}:00",
        slots.len(),
        hours.start_hour,
        hours.end_hour
    );
    slots
}

pub fn format_slot(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub fn parse_slot(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| format!("Failed to parse time slot '{}': {}", value, e))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Failed to parse date '{}': {}", value, e))
}

// "4月10日（木）"
pub fn format_date_for_display(date: NaiveDate) -> String {
    format!(
        "{}月{}日（{}）",
        date.month(),
        date.day(),
        weekday_label(date)
    )
}

#[cfg(test)]
#[path = "time_slots_test.rs"]
mod time_slots_test;
