//! Dashboard figures derived from a snapshot of the collection.
//!
//! Pure functions of `(records, today)`; an empty snapshot yields zeros.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Date, Duration};

use super::model::{format_day, AppointmentRecord, AppointmentStatus, ServiceType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueBucket {
    /// `DD/MM`
    pub day: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today: String,
    pub total_revenue: f64,
    pub today_revenue: f64,
    pub today_completed: usize,
    pub today_upcoming: usize,
    pub last_7_days: Vec<RevenueBucket>,
    pub completed_by_service: BTreeMap<ServiceType, usize>,
}

fn completed(records: &[AppointmentRecord]) -> impl Iterator<Item = &AppointmentRecord> {
    records
        .iter()
        .filter(|r| r.status == AppointmentStatus::Completed)
}

fn on_day<'a>(
    records: &'a [AppointmentRecord],
    today: Date,
) -> impl Iterator<Item = &'a AppointmentRecord> {
    let key = format_day(today);
    records.iter().filter(move |r| r.date == key)
}

pub fn total_revenue(records: &[AppointmentRecord]) -> f64 {
    completed(records).map(|r| r.price).sum()
}

pub fn today_revenue(records: &[AppointmentRecord], today: Date) -> f64 {
    on_day(records, today)
        .filter(|r| r.status == AppointmentStatus::Completed)
        .map(|r| r.price)
        .sum()
}

pub fn today_completed_count(records: &[AppointmentRecord], today: Date) -> usize {
    on_day(records, today)
        .filter(|r| r.status == AppointmentStatus::Completed)
        .count()
}

pub fn today_upcoming_count(records: &[AppointmentRecord], today: Date) -> usize {
    on_day(records, today)
        .filter(|r| r.status.is_upcoming())
        .count()
}

/// Seven buckets, oldest first, ending at `today`.
///
/// Records match a bucket on day and month only, so a completed service from
/// the same day/month of an earlier year is counted too.
pub fn last_7_days_revenue_series(records: &[AppointmentRecord], today: Date) -> Vec<RevenueBucket> {
    (0..7i64)
        .rev()
        .map(|back| {
            let day = today.checked_sub(Duration::days(back)).unwrap_or(Date::MIN);
            let key = format!("{:02}/{:02}", day.day(), u8::from(day.month()));
            let revenue = completed(records)
                .filter(|r| r.date.get(..5) == Some(key.as_str()))
                .map(|r| r.price)
                .sum();
            RevenueBucket { day: key, revenue }
        })
        .collect()
}

pub fn completed_service_type_counts(records: &[AppointmentRecord]) -> BTreeMap<ServiceType, usize> {
    let mut counts = BTreeMap::new();
    for r in completed(records) {
        *counts.entry(r.service_type).or_insert(0) += 1;
    }
    counts
}

pub fn summarize(records: &[AppointmentRecord], today: Date) -> DashboardSummary {
    DashboardSummary {
        today: format_day(today),
        total_revenue: total_revenue(records),
        today_revenue: today_revenue(records, today),
        today_completed: today_completed_count(records, today),
        today_upcoming: today_upcoming_count(records, today),
        last_7_days: last_7_days_revenue_series(records, today),
        completed_by_service: completed_service_type_counts(records),
    }
}
