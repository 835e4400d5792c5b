use crate::models::{ActionTemplate, LifeValue};

/// Minimum query length before the quick-log list filters by text
const QUICK_QUERY_MIN_CHARS: usize = 2;

/// Templates for quick logging: most used first, optionally narrowed to one
/// value and to a description substring.
pub fn quick_log_templates<'a>(
    templates: &'a [ActionTemplate],
    value_filter: Option<&str>,
    query: &str,
) -> Vec<&'a ActionTemplate> {
    let mut result: Vec<&ActionTemplate> = templates.iter().collect();
    result.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));

    if let Some(value_id) = value_filter {
        result.retain(|t| t.impacts.iter().any(|imp| imp.value_id == value_id));
    }

    let query = query.trim();
    if query.chars().count() >= QUICK_QUERY_MIN_CHARS {
        let query = query.to_lowercase();
        result.retain(|t| t.description.to_lowercase().contains(&query));
    }

    result
}

/// Template manager search over description and impacted value names
pub fn search_templates<'a>(
    templates: &'a [ActionTemplate],
    values: &[LifeValue],
    query: &str,
) -> Vec<&'a ActionTemplate> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return templates.iter().collect();
    }

    templates
        .iter()
        .filter(|t| {
            t.description.to_lowercase().contains(&query)
                || t.impacts.iter().any(|imp| {
                    values
                        .iter()
                        .find(|v| v.id == imp.value_id)
                        .map(|v| v.name.to_lowercase().contains(&query))
                        .unwrap_or(false)
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueImpact;

    fn template(id: &str, description: &str, value_id: &str, usage: u32) -> ActionTemplate {
        ActionTemplate {
            id: id.to_string(),
            description: description.to_string(),
            impacts: vec![ValueImpact::new(value_id, 2.0)],
            is_custom: None,
            usage_count: usage,
        }
    }

    #[test]
    fn test_quick_log_ordering_and_filters() {
        let templates = vec![
            template("a", "Evening walk", "health", 1),
            template("b", "Call mom", "family", 5),
            template("c", "Morning walk", "health", 3),
        ];

        let all: Vec<_> = quick_log_templates(&templates, None, "").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(all, vec!["b", "c", "a"]);

        let health: Vec<_> = quick_log_templates(&templates, Some("health"), "").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(health, vec!["c", "a"]);

        // single character queries do not filter
        assert_eq!(quick_log_templates(&templates, None, "w").len(), 3);

        let walks: Vec<_> = quick_log_templates(&templates, None, "WALK").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(walks, vec!["c", "a"]);
    }

    #[test]
    fn test_search_by_value_name() {
        let values = vec![LifeValue {
            id: "family".to_string(),
            name: "Family".to_string(),
            description: String::new(),
            importance: 9,
        }];
        let templates = vec![template("a", "Walk", "health", 0), template("b", "Call", "family", 0)];

        let found = search_templates(&templates, &values, "fam");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "b");
        assert_eq!(search_templates(&templates, &values, "").len(), 2);
    }
}
