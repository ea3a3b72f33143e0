use serde::{Deserialize, Serialize};
use std::fmt;

/// What a customer message is about. Drives agent selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    SupportQuery,
    Troubleshooting,
    AccountInquiry,
    Complaint,
    SubscriptionInquiry,
    ContentRequest,
    AnalyticsRequest,
    SegmentationRequest,
    GeneralInquiry,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 9] = [
        TaskCategory::SupportQuery,
        TaskCategory::Troubleshooting,
        TaskCategory::AccountInquiry,
        TaskCategory::Complaint,
        TaskCategory::SubscriptionInquiry,
        TaskCategory::ContentRequest,
        TaskCategory::AnalyticsRequest,
        TaskCategory::SegmentationRequest,
        TaskCategory::GeneralInquiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::SupportQuery => "support_query",
            TaskCategory::Troubleshooting => "troubleshooting",
            TaskCategory::AccountInquiry => "account_inquiry",
            TaskCategory::Complaint => "complaint",
            TaskCategory::SubscriptionInquiry => "subscription_inquiry",
            TaskCategory::ContentRequest => "content_request",
            TaskCategory::AnalyticsRequest => "analytics_request",
            TaskCategory::SegmentationRequest => "segmentation_request",
            TaskCategory::GeneralInquiry => "general_inquiry",
        }
    }

    /// Categories the marketing team owns.
    pub fn is_marketing(&self) -> bool {
        matches!(
            self,
            TaskCategory::ContentRequest
                | TaskCategory::AnalyticsRequest
                | TaskCategory::SegmentationRequest
        )
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown task category '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_parses_from_its_name() {
        for category in TaskCategory::ALL {
            assert_eq!(category.as_str().parse::<TaskCategory>().unwrap(), category);
        }
    }

    #[test]
    fn serde_uses_snake_case_names() {
        assert_eq!(
            serde_json::to_string(&TaskCategory::SubscriptionInquiry).unwrap(),
            "\"subscription_inquiry\""
        );
    }

    #[test]
    fn marketing_categories() {
        assert!(TaskCategory::AnalyticsRequest.is_marketing());
        assert!(!TaskCategory::Complaint.is_marketing());
    }
}
