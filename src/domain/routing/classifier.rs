//! Keyword-based intent classification.

use once_cell::sync::Lazy;

use super::phrase::{words, Phrase};
use super::TaskCategory;

/// Classifies the category of a customer message.
pub trait IntentClassifier: Send + Sync {
    /// Classify the category of `message`.
    fn classify(&self, message: &str) -> TaskCategory;

    /// Returns true when the customer says their issue is solved.
    fn signals_resolution(&self, message: &str) -> bool;
}

/// Keyword families in priority order. First family with a hit wins.
const KEYWORDS: &[(TaskCategory, &[&str])] = &[
    (
        TaskCategory::Complaint,
        &[
            "complain*",
            "terrible",
            "unacceptable",
            "worst",
            "ridiculous",
            "disappoint*",
            "refund*",
            "scam*",
            "malalamiko",
        ],
    ),
    (
        TaskCategory::Troubleshooting,
        &[
            "not working",
            "isn't working",
            "doesn't work",
            "does not work",
            "error*",
            "crash*",
            "fail*",
            "broken",
            "can't send",
            "cannot send",
            "unable to",
            "bug",
            "bugs",
            "haifanyi kazi",
        ],
    ),
    (
        TaskCategory::SubscriptionInquiry,
        &[
            "subscri*",
            "premium",
            "upgrade*",
            "downgrade*",
            "plan",
            "plans",
            "pricing",
            "price*",
            "cancel my",
            "billing",
            "bei",
        ],
    ),
    (
        TaskCategory::AccountInquiry,
        &[
            "account*",
            "password*",
            "login",
            "log in",
            "sign in",
            "profile",
            "verify",
            "verification",
            "balance",
            "akaunti",
        ],
    ),
    (
        TaskCategory::AnalyticsRequest,
        &[
            "analytics",
            "campaign performance",
            "metrics",
            "report",
            "reports",
            "engagement rate",
            "conversion*",
            "click-through",
        ],
    ),
    (
        TaskCategory::SegmentationRequest,
        &["segment*", "audience*", "target group", "demographic*", "persona*"],
    ),
    (
        TaskCategory::ContentRequest,
        &[
            "write a",
            "draft",
            "social media post*",
            "newsletter*",
            "blog*",
            "caption*",
            "copy for",
            "content",
            "tangazo",
            "matangazo",
        ],
    ),
    (
        TaskCategory::SupportQuery,
        &[
            "how do i",
            "how can i",
            "how to",
            "help",
            "support",
            "send money",
            "payment*",
            "m-pesa",
            "mpesa",
            "jinsi ya",
            "msaada",
        ],
    ),
];

/// Thanks alone is not a resolution; these must also not follow a negation.
const RESOLUTION_PHRASES: &[&str] = &[
    "that worked",
    "it worked",
    "it works now",
    "working now",
    "problem solved",
    "issue resolved",
    "all sorted",
    "sorted now",
    "fixed now",
    "that fixed it",
    "imefanya kazi",
    "imetatuliwa",
];

static KEYWORD_PHRASES: Lazy<Vec<(TaskCategory, Vec<Phrase>)>> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .map(|(category, words)| (*category, words.iter().map(|w| Phrase::new(w)).collect()))
        .collect()
});

static RESOLUTIONS: Lazy<Vec<Phrase>> =
    Lazy::new(|| RESOLUTION_PHRASES.iter().map(|p| Phrase::new(p)).collect());

/// Simple rule-based intent classifier (default implementation).
#[derive(Debug, Clone, Default)]
pub struct RuleBasedIntentClassifier;

impl RuleBasedIntentClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl IntentClassifier for RuleBasedIntentClassifier {
    fn classify(&self, message: &str) -> TaskCategory {
        let text = words(message);

        KEYWORD_PHRASES
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| p.occurs_in(&text)))
            .map(|(category, _)| *category)
            .unwrap_or(TaskCategory::GeneralInquiry)
    }

    fn signals_resolution(&self, message: &str) -> bool {
        let text = words(message);
        RESOLUTIONS.iter().any(|p| p.occurs_affirmed_in(&text))
    }
}
