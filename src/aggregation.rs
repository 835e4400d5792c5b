//! Derived chart data
//!
//! Two independent projections over the action log:
//! - the radar ("map"): lived experience per value on the same 0-10 axis as importance
//! - the trend: per-day impact sums over a window ending today, daily or cumulative
//!
//! Everything here is pure; callers pass `now` so results are reproducible.

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{DailyAction, LifeValue};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

// ============ Radar ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RadarPoint {
    pub id: String,
    pub name: String,
    pub label: String,
    pub importance: u8,
    pub action_score: f64,
    pub level: f64,
}

/// Map a cumulative impact onto 0..=10, centering an empty history at 5
pub fn normalize_level(action_score: f64) -> f64 {
    (action_score / 2.0 + 5.0).clamp(0.0, 10.0)
}

fn short_label(name: &str) -> String {
    if name.chars().count() > 12 {
        let head: String = name.chars().take(10).collect();
        format!("{}..", head)
    } else {
        name.to_string()
    }
}

/// One point per value, in value order, scored over whatever actions are passed in
pub fn radar(values: &[LifeValue], actions: &[DailyAction]) -> Vec<RadarPoint> {
    values
        .iter()
        .map(|v| {
            let action_score: f64 = actions.iter().filter_map(|a| a.impact_on(&v.id)).sum();
            RadarPoint {
                id: v.id.clone(),
                name: v.name.clone(),
                label: short_label(&v.name),
                importance: v.importance,
                action_score,
                level: normalize_level(action_score),
            }
        })
        .collect()
}

// ============ Time Frames ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl TimeFrame {
    /// Number of day buckets in the window
    pub fn days(&self) -> u32 {
        match self {
            TimeFrame::Day => 1,
            TimeFrame::Week => 7,
            TimeFrame::Month => 30,
            TimeFrame::Year => 365,
        }
    }
}

/// Actions no older than the frame's length, measured back from `now_ms`
pub fn actions_in_time_frame(actions: &[DailyAction], frame: TimeFrame, now_ms: i64) -> Vec<DailyAction> {
    let threshold = now_ms - DAY_MS * frame.days() as i64;
    actions
        .iter()
        .filter(|a| a.timestamp >= threshold)
        .cloned()
        .collect()
}

// ============ Trend ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendMode {
    #[default]
    Daily,
    Cumulative,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendBucket {
    pub date: NaiveDate,
    pub label: String,
    pub scores: BTreeMap<String, f64>, // value_id -> score
}

impl TrendBucket {
    pub fn score(&self, value_id: &str) -> f64 {
        self.scores.get(value_id).copied().unwrap_or(0.0)
    }
}

/// Bucket impacts by calendar day (in `now`'s time zone) over `frame`, oldest first.
///
/// Every bucket carries a zero for every known value, so quiet days and quiet
/// values still plot. Impacts on unknown values and actions outside the window
/// are dropped.
pub fn time_series<Tz: TimeZone>(
    values: &[LifeValue],
    actions: &[DailyAction],
    frame: TimeFrame,
    mode: TrendMode,
    now: &DateTime<Tz>,
) -> Vec<TrendBucket> {
    let today = now.date_naive();
    let zeroes: BTreeMap<String, f64> = values.iter().map(|v| (v.id.clone(), 0.0)).collect();

    let mut buckets: Vec<TrendBucket> = (0..frame.days())
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
        .map(|date| TrendBucket {
            date,
            label: date.format("%b %-d").to_string(),
            scores: zeroes.clone(),
        })
        .collect();

    let index: HashMap<NaiveDate, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (b.date, i))
        .collect();

    let tz = now.timezone();
    for action in actions {
        let Some(at) = tz.timestamp_millis_opt(action.timestamp).single() else {
            continue;
        };
        let Some(&slot) = index.get(&at.date_naive()) else {
            continue;
        };
        for imp in &action.impacts {
            if let Some(score) = buckets[slot].scores.get_mut(&imp.value_id) {
                *score += imp.impact;
            }
        }
    }

    if mode == TrendMode::Cumulative {
        let mut running = zeroes;
        for bucket in buckets.iter_mut() {
            for (value_id, score) in bucket.scores.iter_mut() {
                let total = running.entry(value_id.clone()).or_insert(0.0);
                *total += *score;
                *score = *total;
            }
        }
    }

    buckets
}

// ============ Value Detail ============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValueDetail {
    pub value: LifeValue,
    pub total_impact: f64,
    pub actions: Vec<DailyAction>,
}

/// Everything logged against one value, newest first as in the log
pub fn value_detail(value: &LifeValue, actions: &[DailyAction]) -> ValueDetail {
    let touching: Vec<DailyAction> = actions
        .iter()
        .filter(|a| a.impacts.iter().any(|i| i.value_id == value.id))
        .cloned()
        .collect();
    let total_impact = touching.iter().filter_map(|a| a.impact_on(&value.id)).sum();

    ValueDetail {
        value: value.clone(),
        total_impact,
        actions: touching,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueImpact;
    use chrono::{Duration, Utc};

    fn value(id: &str, importance: u8) -> LifeValue {
        LifeValue {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            importance,
        }
    }

    fn action(ts: i64, impacts: &[(&str, f64)]) -> DailyAction {
        DailyAction {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: ts,
            description: "x".to_string(),
            impacts: impacts.iter().map(|(v, i)| ValueImpact::new(v, *i)).collect(),
            mood: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_radar_scenario_health() {
        let values = vec![value("health", 8)];
        let actions = vec![action(1, &[("health", 3.0)]), action(2, &[("health", -1.0)])];

        let points = radar(&values, &actions);
        assert_eq!(points[0].importance, 8);
        assert_eq!(points[0].action_score, 2.0);
        assert_eq!(points[0].level, 6.0);
    }

    #[test]
    fn test_radar_neutral_without_actions() {
        let values = vec![value("health", 8), value("work", 3)];
        let actions = vec![action(1, &[("health", 5.0)])];
        let points = radar(&values, &actions);
        assert_eq!(points[1].level, 5.0);
    }

    #[test]
    fn test_normalize_level_bounded_and_monotonic() {
        let mut previous = normalize_level(-1000.0);
        assert_eq!(previous, 0.0);
        let mut score = -40.0;
        while score <= 40.0 {
            let level = normalize_level(score);
            assert!((0.0..=10.0).contains(&level));
            assert!(level >= previous);
            previous = level;
            score += 0.5;
        }
        assert_eq!(normalize_level(1000.0), 10.0);
        assert_eq!(normalize_level(0.0), 5.0);
    }

    #[test]
    fn test_radar_label_truncation() {
        let mut long = value("x", 5);
        long.name = "Relationships with partner".to_string();
        let points = radar(&[long], &[]);
        assert_eq!(points[0].label, "Relationsh..");
    }

    #[test]
    fn test_empty_log_yields_zero_series() {
        let values = vec![value("health", 8)];
        for frame in [TimeFrame::Day, TimeFrame::Week, TimeFrame::Month, TimeFrame::Year] {
            let series = time_series(&values, &[], frame, TrendMode::Daily, &now());
            assert_eq!(series.len(), frame.days() as usize);
            assert!(series.iter().all(|b| b.score("health") == 0.0));
        }
    }

    #[test]
    fn test_series_is_chronological_and_ends_today() {
        let series = time_series(&[value("a", 1)], &[], TimeFrame::Week, TrendMode::Daily, &now());
        assert_eq!(series.last().unwrap().date, now().date_naive());
        assert_eq!(series.first().unwrap().date, now().date_naive() - Duration::days(6));
        assert!(series.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(series.last().unwrap().label, "Oct 16");
    }

    #[test]
    fn test_daily_buckets_and_dropped_entries() {
        let values = vec![value("health", 8), value("work", 5)];
        let today = now().timestamp_millis();
        let yesterday = (now() - Duration::days(1)).timestamp_millis();
        let long_ago = (now() - Duration::days(40)).timestamp_millis();
        let actions = vec![
            action(today, &[("health", 2.0), ("ghost", 9.0)]),
            action(today, &[("health", 1.5)]),
            action(yesterday, &[("work", -2.0)]),
            action(long_ago, &[("health", 5.0)]),
        ];

        let series = time_series(&values, &actions, TimeFrame::Week, TrendMode::Daily, &now());
        let last = &series[6];
        assert_eq!(last.score("health"), 3.5);
        assert_eq!(last.score("work"), 0.0);
        assert!(!last.scores.contains_key("ghost"));
        assert_eq!(series[5].score("work"), -2.0);
        assert_eq!(series.iter().map(|b| b.score("health")).sum::<f64>(), 3.5);
    }

    #[test]
    fn test_daily_sum_equals_final_cumulative() {
        let values = vec![value("health", 8), value("work", 5)];
        let mut actions = Vec::new();
        for d in 0..30 {
            let ts = (now() - Duration::days(d)).timestamp_millis();
            actions.push(action(ts, &[("health", (d % 5) as f64 - 2.0), ("work", 0.5)]));
        }

        for frame in [TimeFrame::Week, TimeFrame::Month, TimeFrame::Year] {
            let daily = time_series(&values, &actions, frame, TrendMode::Daily, &now());
            let cumulative = time_series(&values, &actions, frame, TrendMode::Cumulative, &now());
            for v in &values {
                let sum: f64 = daily.iter().map(|b| b.score(&v.id)).sum();
                let last = cumulative.last().unwrap().score(&v.id);
                assert!((sum - last).abs() < 1e-9, "{} {:?}", v.id, frame);
            }
        }
    }

    #[test]
    fn test_actions_in_time_frame() {
        let now_ms = now().timestamp_millis();
        let actions = vec![
            action(now_ms - DAY_MS / 2, &[("a", 1.0)]),
            action(now_ms - DAY_MS * 3, &[("a", 1.0)]),
        ];
        assert_eq!(actions_in_time_frame(&actions, TimeFrame::Day, now_ms).len(), 1);
        assert_eq!(actions_in_time_frame(&actions, TimeFrame::Week, now_ms).len(), 2);
    }

    #[test]
    fn test_value_detail_totals() {
        let health = value("health", 8);
        let actions = vec![
            action(2, &[("health", 3.0), ("work", 1.0)]),
            action(1, &[("work", 1.0)]),
            action(0, &[("health", -1.0)]),
        ];
        let detail = value_detail(&health, &actions);
        assert_eq!(detail.actions.len(), 2);
        assert_eq!(detail.total_impact, 2.0);
    }
}
