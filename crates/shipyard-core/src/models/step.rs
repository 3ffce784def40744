//! Roadmap step model and the default roadmap template.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stage of an idea's roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Step {
    /// Stable identifier taken from the roadmap template (e.g. `launch`).
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            is_completed: false,
            completed_at: None,
        }
    }

    /// Make `completed_at` agree with `is_completed`: a completed step
    /// without a timestamp is stamped with `now`, an open step loses its
    /// timestamp.
    pub fn normalized(mut self, now: DateTime<Utc>) -> Self {
        if self.is_completed {
            self.completed_at.get_or_insert(now);
        } else {
            self.completed_at = None;
        }
        self
    }
}

/// `(id, name, description)` for every step of the default roadmap, in
/// order.
pub const DEFAULT_ROADMAP: &[(&str, &str, &str)] = &[
    (
        "idea",
        "Define the Core Idea",
        "Outline the problem you're solving and the solution you're offering.",
    ),
    (
        "validation",
        "Validate Your Idea",
        "Gather feedback, validate demand, and refine your concept based on insights.",
    ),
    (
        "planning",
        "Research & Planning",
        "Plan features, technology stack, and roadmap for your project.",
    ),
    (
        "prototyping",
        "Create Mockups or Prototypes",
        "Design initial wireframes or prototypes to visualize your idea.",
    ),
    (
        "development",
        "Build the MVP",
        "Develop the core features of your product with minimal scope.",
    ),
    (
        "testing",
        "Test & Iterate",
        "Test your MVP with real users, gather feedback, and improve.",
    ),
    (
        "launch",
        "Launch Your Product",
        "Ship your MVP to your audience and start building traction.",
    ),
    (
        "promote",
        "Promote & Share",
        "Promote your product to reach your target audience through social media, \
         forums, or communities.",
    ),
    (
        "analyze",
        "Track & Analyze",
        "Monitor engagement, user feedback, and performance metrics to plan next steps.",
    ),
];

/// Fresh, uncompleted copy of the default roadmap.
pub fn default_steps() -> Vec<Step> {
    DEFAULT_ROADMAP
        .iter()
        .map(|(id, name, description)| Step::new(*id, *name, *description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roadmap_order() {
        let ids: Vec<String> = default_steps().into_iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            [
                "idea",
                "validation",
                "planning",
                "prototyping",
                "development",
                "testing",
                "launch",
                "promote",
                "analyze"
            ]
        );
        assert!(default_steps().iter().all(|s| !s.is_completed));
    }

    #[test]
    fn normalized_stamps_and_clears() {
        let now = Utc::now();
        let mut step = Step::new("launch", "Launch", "Ship it");
        step.is_completed = true;
        let stamped = step.clone().normalized(now);
        assert_eq!(stamped.completed_at, Some(now));

        // An existing stamp is kept.
        let later = now + chrono::Duration::hours(1);
        assert_eq!(stamped.clone().normalized(later).completed_at, Some(now));

        let mut reopened = stamped;
        reopened.is_completed = false;
        assert_eq!(reopened.normalized(later).completed_at, None);
    }
}
