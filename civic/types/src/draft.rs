use {
    crate::Category,
    serde::{Deserialize, Serialize},
    serde_with::skip_serializing_none,
};

/// An in-progress submission, kept so a user can resume it later.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Draft {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub summary: String,
    pub category: Option<Category>,
    /// Image attachment as a data URL.
    pub image: Option<String>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.summary.trim().is_empty()
            && self.category.is_none()
            && self.image.is_none()
    }

    /// Share of the required fields (text, summary, category) filled in,
    /// from 0 to 1.
    pub fn completion(&self) -> f64 {
        let filled = [
            !self.text.trim().is_empty(),
            !self.summary.trim().is_empty(),
            self.category.is_some(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count();

        filled as f64 / 3.0
    }
}

// ----------------------------------- tests -----------------------------------
