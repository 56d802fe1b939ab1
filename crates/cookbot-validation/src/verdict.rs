//! Auditor verdicts

use serde::{Deserialize, Serialize};
use serde_json::Value;

use cookbot_agent::{extract_json_object, string_field};

/// Rationale used when a rejection carries none
pub const DEFAULT_REJECTION: &str = "Rejected";

/// Rationale used when the auditor's answer could not be read
pub const UNREADABLE_RESPONSE: &str = "unreadable response";

/// Outcome of one audit
///
/// `Malformed` covers answers without a readable `approved` flag, including
/// the empty object a failed model call degrades to. Callers treat it as a
/// rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Approved {
        rationale: Option<String>,
        calories: Option<String>,
    },
    Rejected {
        rationale: String,
    },
    Malformed,
}

impl Verdict {
    /// Read `{"approved": bool, "feedback": str, "calories": str?}`
    pub fn parse(text: &str) -> Self {
        let Some(object) = extract_json_object(text) else {
            return Verdict::Malformed;
        };

        let approved = match object.get("approved") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
            _ => return Verdict::Malformed,
        };

        let rationale = string_field(&object, "feedback");
        if approved {
            Verdict::Approved {
                rationale,
                calories: string_field(&object, "calories"),
            }
        } else {
            Verdict::Rejected {
                rationale: rationale.unwrap_or_else(|| DEFAULT_REJECTION.to_string()),
            }
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved { .. })
    }

    /// Feedback line for the generator, `None` when approved
    pub fn feedback_note(&self, auditor_label: &str) -> Option<String> {
        match self {
            Verdict::Approved { .. } => None,
            Verdict::Rejected { rationale } => Some(format!("{}: {}", auditor_label, rationale)),
            Verdict::Malformed => Some(format!("{}: {}", auditor_label, UNREADABLE_RESPONSE)),
        }
    }

    /// Calorie estimate of an approval
    pub fn calories(&self) -> Option<&str> {
        match self {
            Verdict::Approved { calories, .. } => calories.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_approved_with_calories() {
        let verdict = Verdict::parse(r#"{"approved": true, "calories": 650, "feedback": "Balanced"}"#);
        assert!(verdict.is_approved());
        assert_eq!(verdict.calories(), Some("650"));
        assert_eq!(verdict.feedback_note("Nutrition"), None);
    }

    #[test]
    fn test_parse_rejected() {
        let verdict = Verdict::parse(r#"{"approved": false, "feedback": "Saffron is too expensive"}"#);
        assert_eq!(
            verdict.feedback_note("Logistics").as_deref(),
            Some("Logistics: Saffron is too expensive")
        );
        assert_eq!(verdict.calories(), None);

        let bare = Verdict::parse(r#"{"approved": false}"#);
        assert_eq!(
            bare.feedback_note("Logistics").as_deref(),
            Some("Logistics: Rejected")
        );
    }

    #[test]
    fn test_parse_string_flag() {
        assert!(Verdict::parse(r#"{"approved": "TRUE"}"#).is_approved());
        assert!(matches!(
            Verdict::parse(r#"{"approved": "false"}"#),
            Verdict::Rejected { .. }
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(Verdict::parse(""), Verdict::Malformed);
        assert_eq!(Verdict::parse("{}"), Verdict::Malformed);
        assert_eq!(Verdict::parse("looks fine to me"), Verdict::Malformed);
        assert_eq!(Verdict::parse(r#"{"approved": "maybe"}"#), Verdict::Malformed);
        assert_eq!(
            Verdict::Malformed.feedback_note("Nutrition").as_deref(),
            Some("Nutrition: unreadable response")
        );
    }
}
