//! History view: search and sort over the action log

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{DailyAction, LifeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Impact,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for HistorySort {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            order: SortOrder::Desc,
        }
    }
}

impl HistorySort {
    /// Picking the current field again flips the order; a new field starts descending
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.order = self.order.flipped();
        } else {
            self.field = field;
            self.order = SortOrder::Desc;
        }
    }
}

/// Case-insensitive match on the description or on any impacted value's name
pub fn matches_query(action: &DailyAction, values: &[LifeValue], query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    if action.description.to_lowercase().contains(&query) {
        return true;
    }

    action.impacts.iter().any(|imp| {
        values
            .iter()
            .find(|v| v.id == imp.value_id)
            .map(|v| v.name.to_lowercase().contains(&query))
            .unwrap_or(false)
    })
}

fn first_value_name<'a>(action: &DailyAction, values: &'a [LifeValue]) -> &'a str {
    action
        .impacts
        .first()
        .and_then(|imp| values.iter().find(|v| v.id == imp.value_id))
        .map(|v| v.name.as_str())
        .unwrap_or("")
}

fn compare(a: &DailyAction, b: &DailyAction, field: SortField, values: &[LifeValue]) -> Ordering {
    match field {
        SortField::Date => a.timestamp.cmp(&b.timestamp),
        SortField::Impact => a
            .total_impact()
            .partial_cmp(&b.total_impact())
            .unwrap_or(Ordering::Equal),
        SortField::Value => first_value_name(a, values)
            .to_lowercase()
            .cmp(&first_value_name(b, values).to_lowercase()),
    }
}

/// Filter by `query` then sort. The sort is stable, so ties keep log order.
pub fn filter_and_sort<'a>(
    actions: &'a [DailyAction],
    values: &[LifeValue],
    query: &str,
    sort: HistorySort,
) -> Vec<&'a DailyAction> {
    let mut result: Vec<&DailyAction> = actions
        .iter()
        .filter(|a| matches_query(a, values, query))
        .collect();

    result.sort_by(|a, b| {
        let ordering = compare(a, b, sort.field, values);
        match sort.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueImpact;

    fn value(id: &str, name: &str) -> LifeValue {
        LifeValue {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            importance: 5,
        }
    }

    fn action(id: &str, ts: i64, description: &str, impacts: &[(&str, f64)]) -> DailyAction {
        DailyAction {
            id: id.to_string(),
            timestamp: ts,
            description: description.to_string(),
            impacts: impacts.iter().map(|(v, i)| ValueImpact::new(v, *i)).collect(),
            mood: None,
        }
    }

    fn ids(list: &[&DailyAction]) -> Vec<String> {
        list.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_sort_toggle_and_reset() {
        let mut sort = HistorySort::default();
        assert_eq!(sort.order, SortOrder::Desc);

        sort.select(SortField::Date);
        assert_eq!(sort, HistorySort { field: SortField::Date, order: SortOrder::Asc });
        sort.select(SortField::Date);
        assert_eq!(sort.order, SortOrder::Desc);

        sort.select(SortField::Date);
        sort.select(SortField::Impact);
        assert_eq!(sort, HistorySort { field: SortField::Impact, order: SortOrder::Desc });
    }

    #[test]
    fn test_search_matches_value_name() {
        let values = vec![value("health", "Health"), value("work", "Work")];
        let actions = vec![
            action("a", 1, "Morning jog", &[("health", 2.0)]),
            action("b", 2, "Report", &[("work", 3.0)]),
        ];

        let found = filter_and_sort(&actions, &values, "HEALTH", HistorySort::default());
        assert_eq!(ids(&found), vec!["a"]);

        let found = filter_and_sort(&actions, &values, "report", HistorySort::default());
        assert_eq!(ids(&found), vec!["b"]);

        let found = filter_and_sort(&actions, &values, "   ", HistorySort::default());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_search_ignores_unknown_values() {
        let values = vec![value("health", "Health")];
        let actions = vec![action("a", 1, "Something", &[("ghost", 1.0)])];
        assert!(filter_and_sort(&actions, &values, "unknown", HistorySort::default()).is_empty());
    }

    #[test]
    fn test_sort_by_impact_and_value() {
        let values = vec![value("health", "Health"), value("work", "Work"), value("art", "Art")];
        let actions = vec![
            action("a", 3, "x", &[("work", 1.0), ("health", 1.0)]),
            action("b", 2, "y", &[("health", -3.0)]),
            action("c", 1, "z", &[("art", 4.0)]),
        ];

        let by_impact = filter_and_sort(
            &actions,
            &values,
            "",
            HistorySort { field: SortField::Impact, order: SortOrder::Desc },
        );
        assert_eq!(ids(&by_impact), vec!["c", "a", "b"]);

        let by_value = filter_and_sort(
            &actions,
            &values,
            "",
            HistorySort { field: SortField::Value, order: SortOrder::Asc },
        );
        assert_eq!(ids(&by_value), vec!["c", "b", "a"]);

        let by_date = filter_and_sort(
            &actions,
            &values,
            "",
            HistorySort { field: SortField::Date, order: SortOrder::Asc },
        );
        assert_eq!(ids(&by_date), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_value_sort_is_stable_for_ties() {
        let values = vec![value("health", "Health")];
        let actions = vec![
            action("first", 2, "x", &[("health", 1.0)]),
            action("second", 1, "y", &[("health", 2.0)]),
        ];
        let sorted = filter_and_sort(
            &actions,
            &values,
            "",
            HistorySort { field: SortField::Value, order: SortOrder::Asc },
        );
        assert_eq!(ids(&sorted), vec!["first", "second"]);
    }

    #[test]
    fn test_value_sort_ignores_case() {
        let values = vec![value("work", "Work"), value("art", "art"), value("health", "Health")];
        let actions = vec![
            action("w", 3, "x", &[("work", 1.0)]),
            action("a", 2, "y", &[("art", 1.0)]),
            action("h", 1, "z", &[("health", 1.0)]),
        ];
        let sorted = filter_and_sort(
            &actions,
            &values,
            "",
            HistorySort { field: SortField::Value, order: SortOrder::Asc },
        );
        assert_eq!(ids(&sorted), vec!["a", "h", "w"]);
    }
}
