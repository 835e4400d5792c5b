// Seed data and fixed texts for Compass.
// Value catalog and default templates are what a fresh journal starts with.

use crate::models::{ActionTemplate, ValueImpact};

/// Storage key for the serialized journal. The suffix is the only versioning.
pub const STORAGE_KEY: &str = "act_values_app_state_v6";

pub const APP_NAME: &str = "Values Compass";
pub const NOTIFICATION_ICON: &str = "https://cdn-icons-png.flaticon.com/512/3135/3135715.png";

pub const REMINDER_PHRASES: [&str; 4] = [
    "Time to check your compass! Which of today's actions brought you closer to your values?",
    "A mindful minute: what did you do today that truly mattered to you?",
    "Values are a path, not a destination. Where are you heading today?",
    "Your Compass is waiting. Log your wins, even the smallest ones.",
];

pub const TEST_NOTIFICATION_TITLE: &str = "Compass check";
pub const TEST_NOTIFICATION_BODY: &str =
    "This is a test reminder! You are on the right path toward your values.";

/// Impact credited to the mission's value when a mission is completed
pub const MISSION_IMPACT: f64 = 4.0;

/// How long a batch stays undoable
pub const UNDO_WINDOW_MS: i64 = 8_000;

pub const DEFAULT_IMPORTANCE: u8 = 5;
pub const CUSTOM_VALUE_DESCRIPTION: &str = "Your personal value.";

/// A life domain offered during onboarding
#[derive(Debug, Clone, Copy)]
pub struct ValuePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const VALUE_CATALOG: [ValuePreset; 13] = [
    ValuePreset { id: "family", name: "Family (parents)", description: "Relationships with parents, brothers and sisters." },
    ValuePreset { id: "partner", name: "Partner relationship", description: "Closeness, support and love as a couple." },
    ValuePreset { id: "sex", name: "Sex / intimacy", description: "Physical closeness and sexual expression." },
    ValuePreset { id: "parenting", name: "Parenting", description: "Raising children and the role of a parent." },
    ValuePreset { id: "friends", name: "Friends", description: "Social ties and deep friendship." },
    ValuePreset { id: "learning", name: "Learning / growth", description: "New knowledge, skills and personal growth." },
    ValuePreset { id: "health", name: "Health", description: "Physical condition and absence of illness." },
    ValuePreset { id: "spirituality", name: "Spirituality", description: "Search for meaning, faith or connection to something bigger." },
    ValuePreset { id: "community", name: "Community", description: "Contribution to society, volunteering." },
    ValuePreset { id: "self-care", name: "Self-care", description: "Sleep, nutrition, rest." },
    ValuePreset { id: "work", name: "Work", description: "Career, professionalism, achievements." },
    ValuePreset { id: "leisure", name: "Leisure / fun", description: "Hobbies, games, pleasures." },
    ValuePreset { id: "finance", name: "Money & wellbeing", description: "Financial stability and security." },
];

pub fn find_preset(id: &str) -> Option<&'static ValuePreset> {
    VALUE_CATALOG.iter().find(|p| p.id == id)
}

// (id, description, impacts)
const TEMPLATE_SEEDS: &[(&str, &str, &[(&str, f64)])] = &[
    // health
    ("h1", "Did morning exercises", &[("health", 2.0)]),
    ("h2", "30 minute walk", &[("health", 2.0), ("self-care", 1.0)]),
    ("h3", "Saw a doctor", &[("health", 4.0)]),
    ("h5", "Intense workout", &[("health", 5.0)]),
    ("h6", "Drank 2l of water", &[("health", 2.0)]),
    ("h7", "No sugar today", &[("health", 3.0)]),
    ("h8", "Smoked a cigarette", &[("health", -3.0)]),
    ("h9", "Drank alcohol", &[("health", -4.0), ("self-care", -2.0)]),
    ("h10", "Bad hangover", &[("health", -5.0), ("work", -3.0), ("self-care", -3.0)]),
    ("h12", "Skipped medication", &[("health", -4.0)]),
    // family
    ("f1", "Called my parents", &[("family", 3.0)]),
    ("f2", "Family dinner", &[("family", 4.0)]),
    ("f3", "Helped relatives with chores", &[("family", 3.0)]),
    ("f5", "Argued with my parents", &[("family", -4.0)]),
    ("f6", "Ignored a call from family", &[("family", -2.0)]),
    // partner
    ("p1", "Date with my partner", &[("partner", 5.0)]),
    ("p2", "Honest talk about feelings", &[("partner", 4.0)]),
    ("p4", "Fight with my partner", &[("partner", -5.0)]),
    ("p6", "Supported my partner in a hard moment", &[("partner", 4.0)]),
    ("p7", "Evening without phones", &[("partner", 4.0), ("self-care", 2.0)]),
    // self-care
    ("sc1", "In bed before 23:00", &[("self-care", 4.0), ("health", 2.0)]),
    ("sc3", "An hour without gadgets", &[("self-care", 3.0)]),
    ("sc4", "Saw a therapist", &[("self-care", 5.0), ("health", 2.0)]),
    ("sc5", "Stress eating", &[("self-care", -3.0), ("health", -2.0)]),
    ("sc6", "Slept less than 6 hours", &[("self-care", -4.0), ("health", -3.0)]),
    ("sc7", "Whole day on social media", &[("self-care", -3.0), ("learning", -2.0)]),
    // work
    ("w1", "Finished an important task", &[("work", 5.0)]),
    ("w2", "Focused work without distractions", &[("work", 4.0)]),
    ("w3", "Helped a colleague", &[("work", 3.0), ("community", 1.0)]),
    ("w4", "Procrastinated all day", &[("work", -5.0)]),
    // learning
    ("l1", "Read a book for 30 minutes", &[("learning", 3.0)]),
    ("l2", "Took an online course lesson", &[("learning", 4.0)]),
    // finance
    ("fi2", "Reviewed weekly spending", &[("finance", 3.0)]),
    ("fi3", "Impulse purchase", &[("finance", -3.0)]),
    ("fi5", "Found a new source of income", &[("finance", 5.0), ("work", 2.0)]),
    // friends
    ("fr1", "Met with friends", &[("friends", 5.0)]),
    ("fr2", "Texted a friend to check in", &[("friends", 2.0)]),
    ("fr4", "Cancelled plans last minute", &[("friends", -3.0)]),
    ("fr5", "Gossiped about friends", &[("friends", -4.0), ("spirituality", -2.0)]),
    // spirituality
    ("sp1", "Meditation", &[("spirituality", 3.0), ("self-care", 2.0)]),
    ("sp3", "Gratitude practice", &[("spirituality", 4.0)]),
    ("sp4", "Acted against my values", &[("spirituality", -5.0)]),
    // community
    ("cm1", "Donated to charity", &[("community", 4.0), ("finance", -1.0)]),
    ("cm2", "Volunteered", &[("community", 5.0)]),
    ("cm4", "Littered in the street", &[("community", -4.0)]),
    // leisure
    ("ls1", "Went to the cinema / an exhibition", &[("leisure", 3.0)]),
    ("ls3", "Spent the whole day on the couch", &[("leisure", 1.0), ("self-care", -2.0), ("work", -2.0)]),
    ("ls4", "Trip out of town", &[("leisure", 5.0), ("self-care", 3.0)]),
    // parenting
    ("pr1", "Played with my child", &[("parenting", 5.0)]),
    ("pr2", "Helped my child with homework", &[("parenting", 4.0)]),
    ("pr3", "Snapped at my child", &[("parenting", -5.0)]),
    // sex
    ("sx1", "Intimacy", &[("sex", 5.0), ("partner", 3.0)]),
    ("sx3", "Refused closeness without explanation", &[("sex", -2.0), ("partner", -2.0)]),
];

/// Templates every fresh (or reset) journal starts with
pub fn default_templates() -> Vec<ActionTemplate> {
    TEMPLATE_SEEDS
        .iter()
        .map(|(id, description, impacts)| ActionTemplate {
            id: id.to_string(),
            description: description.to_string(),
            impacts: impacts
                .iter()
                .map(|(value_id, impact)| ValueImpact::new(value_id, *impact))
                .collect(),
            is_custom: None,
            usage_count: 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_templates_reference_catalog_values() {
        let templates = default_templates();
        assert!(!templates.is_empty());

        let ids: HashSet<_> = templates.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids.len(), templates.len(), "template ids must be unique");

        for template in &templates {
            assert_eq!(template.usage_count, 0);
            for impact in &template.impacts {
                assert!(find_preset(&impact.value_id).is_some(), "unknown value {}", impact.value_id);
                assert!((-5.0..=5.0).contains(&impact.impact));
            }
        }
    }
}
