use {
    serde::{Deserialize, Serialize},
    std::{convert::Infallible, fmt, str::FromStr},
};

/// The topic a proposal is filed under.
///
/// On chain the category is a free-form string. The platform offers a fixed
/// set of choices, but anything else the contract returns is kept verbatim
/// in [`Category::Other`] so that histograms never lose a bucket.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Transportation,
    PublicSafety,
    Environment,
    EventsAndCulture,
    Governance,
    Other(String),
}

impl Category {
    pub const KNOWN: [Category; 5] = [
        Category::Transportation,
        Category::PublicSafety,
        Category::Environment,
        Category::EventsAndCulture,
        Category::Governance,
    ];

    /// The label used when the contract or the search service returns an
    /// empty category.
    pub const FALLBACK_LABEL: &'static str = "Other";

    pub fn as_str(&self) -> &str {
        match self {
            Category::Transportation => "Transportation",
            Category::PublicSafety => "Public Safety",
            Category::Environment => "Environment",
            Category::EventsAndCulture => "Events & Culture",
            Category::Governance => "Governance",
            Category::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other(Self::FALLBACK_LABEL.to_string())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Ok(Category::default());
        }

        Ok(Category::KNOWN
            .into_iter()
            .find(|known| known.as_str() == s)
            .unwrap_or_else(|| Category::Other(s.to_string())))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match Category::from_str(&s) {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, test_case::test_case};

    #[test_case("Transportation", Category::Transportation; "plain label")]
    #[test_case("Public Safety", Category::PublicSafety; "label with a space")]
    #[test_case("Events & Culture", Category::EventsAndCulture; "label with an ampersand")]
    #[test_case("  Governance ", Category::Governance; "surrounding whitespace")]
    #[test_case("Housing", Category::Other("Housing".to_string()); "unknown label is kept")]
    #[test_case("", Category::Other("Other".to_string()); "empty label")]
    fn parsing_category(input: &str, expect: Category) {
        assert_that!(Category::from(input)).is_equal_to(expect);
    }

    #[test]
    fn category_serializes_as_its_label() {
        let json = serde_json::to_string(&Category::PublicSafety).unwrap();
        assert_that!(json.as_str()).is_equal_to("\"Public Safety\"");

        let category: Category = serde_json::from_str("\"Housing\"").unwrap();
        assert_that!(category).is_equal_to(Category::Other("Housing".to_string()));
    }
}
