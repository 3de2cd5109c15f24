//! Normalization of semantic search results.
//!
//! The search service returns whatever metadata was stored next to each
//! embedding, so nothing about its shape is guaranteed. Each result is
//! either turned into a fully-typed [`SearchHit`] or rejected; there is no
//! half-parsed state in between.

use {
    crate::{Category, ProposalId},
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
    thiserror::Error,
};

pub const NO_TEXT: &str = "No text provided.";
pub const NO_SUMMARY: &str = "No summary provided.";
pub const UNKNOWN_SUBMITTER: &str = "Unknown";
pub const UNKNOWN_TIMESTAMP: &str = "Unknown";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("search result #{position} is not an object, found: {found}")]
    NotAnObject { position: usize, found: String },
}

/// A proposal as the search service knows it. Looser than the on-chain
/// record: submitter and timestamp are free text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: ProposalId,
    pub text: String,
    pub summary: String,
    pub category: Category,
    pub submitter: String,
    pub timestamp: String,
    pub likes: u64,
    pub dislikes: u64,
    pub has_voted: bool,
    pub user_vote: Option<bool>,
}

impl SearchHit {
    /// `position` is the index of the result in the response, used as the
    /// id when the result carries no usable one.
    pub fn from_json(position: usize, value: &Value) -> Result<Self, SearchError> {
        let Value::Object(fields) = value else {
            return Err(SearchError::NotAnObject {
                position,
                found: value.to_string(),
            });
        };

        Ok(Self {
            id: coerce_u64(fields.get("id")).unwrap_or(position as u64),
            text: coerce_string(fields, "text", NO_TEXT),
            summary: coerce_string(fields, "summary", NO_SUMMARY),
            category: Category::from(coerce_string(fields, "category", Category::FALLBACK_LABEL)),
            submitter: coerce_string(fields, "submitter", UNKNOWN_SUBMITTER),
            timestamp: coerce_string(fields, "timestamp", UNKNOWN_TIMESTAMP),
            likes: coerce_u64(fields.get("likes")).unwrap_or(0),
            dislikes: coerce_u64(fields.get("dislikes")).unwrap_or(0),
            has_voted: fields
                .get("hasVoted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            user_vote: fields.get("userVote").and_then(Value::as_bool),
        })
    }
}

/// Normalizes every entry of the `results` array of a search response.
/// A response without such an array has no results.
pub fn search_results(body: &Value) -> Vec<Result<SearchHit, SearchError>> {
    body.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .enumerate()
                .map(|(position, value)| SearchHit::from_json(position, value))
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts non-negative integers, integral floats and decimal strings.
fn coerce_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(fields: &Map<String, Value>, key: &str, placeholder: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => placeholder.to_string(),
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, serde_json::json, test_case::test_case};

    #[test]
    fn well_formed_result() {
        let value = json!({
            "id": "7",
            "text": "Install street lights in the park",
            "summary": "Brighter parks at night.",
            "category": "Public Safety",
            "submitter": "0xabc",
            "timestamp": "1/2/2025, 10:00:00 AM",
            "likes": 4,
            "dislikes": 1,
            "hasVoted": true,
            "userVote": false,
        });

        let hit = SearchHit::from_json(0, &value).unwrap();

        assert_that!(hit).is_equal_to(SearchHit {
            id: 7,
            text: "Install street lights in the park".to_string(),
            summary: "Brighter parks at night.".to_string(),
            category: Category::PublicSafety,
            submitter: "0xabc".to_string(),
            timestamp: "1/2/2025, 10:00:00 AM".to_string(),
            likes: 4,
            dislikes: 1,
            has_voted: true,
            user_vote: Some(false),
        });
    }

    #[test]
    fn missing_fields_get_defaults() {
        let hit = SearchHit::from_json(3, &json!({})).unwrap();

        assert_that!(hit.id).is_equal_to(3);
        assert_that!(hit.text.as_str()).is_equal_to(NO_TEXT);
        assert_that!(hit.summary.as_str()).is_equal_to(NO_SUMMARY);
        assert_that!(hit.category.as_str()).is_equal_to("Other");
        assert_that!(hit.submitter.as_str()).is_equal_to(UNKNOWN_SUBMITTER);
        assert_that!(hit.likes).is_equal_to(0);
        assert_that!(hit.dislikes).is_equal_to(0);
        assert_that!(hit.has_voted).is_false();
        assert_that!(hit.user_vote).is_none();
    }

    #[test_case(json!(12), 12; "integer")]
    #[test_case(json!("12"), 12; "decimal string")]
    #[test_case(json!(12.0), 12; "integral float")]
    #[test_case(json!(-3), 0; "negative")]
    #[test_case(json!(1.5), 0; "fractional")]
    #[test_case(json!("many"), 0; "non-numeric string")]
    #[test_case(json!(null), 0; "null")]
    #[test_case(json!([1]), 0; "array")]
    fn coercing_likes(likes: Value, expect: u64) {
        let hit = SearchHit::from_json(0, &json!({ "likes": likes })).unwrap();

        assert_that!(hit.likes).is_equal_to(expect);
    }

    #[test_case(json!(5), 5; "numeric id")]
    #[test_case(json!("5"), 5; "numeric string id")]
    #[test_case(json!("proposal-5"), 2; "non-numeric id")]
    #[test_case(json!(null), 2; "null id")]
    fn coercing_id(id: Value, expect: u64) {
        let hit = SearchHit::from_json(2, &json!({ "id": id })).unwrap();

        assert_that!(hit.id).is_equal_to(expect);
    }

    #[test]
    fn empty_strings_get_placeholders() {
        let hit = SearchHit::from_json(0, &json!({ "text": "  ", "category": "" })).unwrap();

        assert_that!(hit.text.as_str()).is_equal_to(NO_TEXT);
        assert_that!(hit.category).is_equal_to(Category::default());
    }

    #[test]
    fn non_object_result_is_rejected() {
        let body = json!({ "results": [{ "id": 0 }, "garbage"] });

        let results = search_results(&body);

        assert_that!(results.len()).is_equal_to(2);
        assert_that!(results[0].is_ok()).is_true();
        assert_that!(results[1].clone()).is_equal_to(Err(SearchError::NotAnObject {
            position: 1,
            found: "\"garbage\"".to_string(),
        }));
    }

    #[test_case(json!({}); "missing results")]
    #[test_case(json!({ "results": null }); "null results")]
    #[test_case(json!({ "results": "none" }); "string results")]
    fn malformed_body_has_no_results(body: Value) {
        assert_that!(search_results(&body).is_empty()).is_true();
    }
}
