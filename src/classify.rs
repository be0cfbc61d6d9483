use crate::config::CategoryRules;
use crate::schema::AccountType;

/// Maps account names to an (account type, category) pair by substring
/// matching against the configured keyword tables. Deterministic: the name
/// is the only input, and the first matching category in table order wins.
#[derive(Debug, Clone)]
pub struct AccountClassifier {
    rules: CategoryRules,
}

impl AccountClassifier {
    pub fn new(rules: CategoryRules) -> Self {
        Self { rules }
    }

    pub fn classify(&self, account_name: &str) -> (AccountType, String) {
        if account_name.is_empty() {
            return (AccountType::Unknown, "Other".to_string());
        }

        let name_lower = account_name.to_lowercase();
        let name_lower = name_lower.trim();

        for category in &self.rules.categories {
            if category
                .keywords
                .iter()
                .any(|keyword| name_lower.contains(keyword.as_str()))
            {
                return (category.account_type, category.key.clone());
            }
        }

        (AccountType::Unknown, "other".to_string())
    }
}

impl Default for AccountClassifier {
    fn default() -> Self {
        Self::new(CategoryRules::default())
    }
}
