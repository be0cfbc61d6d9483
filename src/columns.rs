use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical column slots a source header can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    AccountName,
    Debit,
    Credit,
    Balance,
    Amount,
    Type,
    Description,
}

impl CanonicalColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountName => "account_name",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Balance => "balance",
            Self::Amount => "amount",
            Self::Type => "type",
            Self::Description => "description",
        }
    }
}

/// Best-effort mapping from arbitrary source headers to canonical slots.
///
/// Each canonical target is claimed by at most one header, first match
/// wins, and the rule order below is authoritative. Headers matching no
/// rule pass through unmapped; unknown or extra columns are tolerated.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    headers: Vec<String>,
    slots: Vec<Option<CanonicalColumn>>,
}

impl ColumnMap {
    pub fn map_headers(headers: &[String]) -> Self {
        let mut slots: Vec<Option<CanonicalColumn>> = vec![None; headers.len()];
        let mut claimed: Vec<CanonicalColumn> = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let clean = clean_header(header);
            let target = resolve_header(&clean, &claimed);
            if let Some(target) = target {
                claimed.push(target);
                slots[idx] = Some(target);
                debug!("Mapped column '{}' -> {}", header, target.as_str());
            }
        }

        let map = Self {
            headers: headers.to_vec(),
            slots,
        };
        info!("Column mapping applied: {:?}", map.as_mapping());
        map
    }

    /// Index of the header claiming a canonical slot, if any.
    pub fn index_of(&self, target: CanonicalColumn) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(target))
    }

    /// Account-name resolution chain: the canonical slot first, then
    /// unmapped headers literally named "account" or "name".
    pub fn account_name_index(&self) -> Option<usize> {
        if let Some(idx) = self.index_of(CanonicalColumn::AccountName) {
            return Some(idx);
        }
        for literal in ["account", "name"] {
            if let Some(idx) = self
                .headers
                .iter()
                .position(|h| h.trim().to_lowercase() == literal)
            {
                return Some(idx);
            }
        }
        None
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Header -> canonical-name view, for audit details and logging.
    /// Unmapped headers are omitted (they pass through unchanged).
    pub fn as_mapping(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(h, s)| s.map(|slot| (h.clone(), slot.as_str().to_string())))
            .collect()
    }
}

/// Lower-case and strip everything but word characters and spaces.
fn clean_header(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

fn resolve_header(clean: &str, claimed: &[CanonicalColumn]) -> Option<CanonicalColumn> {
    let unclaimed = |t: CanonicalColumn| !claimed.contains(&t);

    if clean.contains("account") && unclaimed(CanonicalColumn::AccountName) {
        Some(CanonicalColumn::AccountName)
    } else if clean.contains("name")
        && !clean.contains("account")
        && unclaimed(CanonicalColumn::AccountName)
    {
        Some(CanonicalColumn::AccountName)
    } else if clean.contains("debit") && unclaimed(CanonicalColumn::Debit) {
        Some(CanonicalColumn::Debit)
    } else if clean.contains("credit") && unclaimed(CanonicalColumn::Credit) {
        Some(CanonicalColumn::Credit)
    } else if clean.contains("balance") && unclaimed(CanonicalColumn::Balance) {
        Some(CanonicalColumn::Balance)
    } else if ["amount", "value", "total"].iter().any(|k| clean.contains(k))
        && unclaimed(CanonicalColumn::Amount)
    {
        Some(CanonicalColumn::Amount)
    } else if clean.contains("type") && unclaimed(CanonicalColumn::Type) {
        Some(CanonicalColumn::Type)
    } else if clean.contains("description") && unclaimed(CanonicalColumn::Description) {
        Some(CanonicalColumn::Description)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_standard_trial_balance_headers() {
        let map = ColumnMap::map_headers(&headers(&["Account Name", "Debit", "Credit"]));
        assert_eq!(map.index_of(CanonicalColumn::AccountName), Some(0));
        assert_eq!(map.index_of(CanonicalColumn::Debit), Some(1));
        assert_eq!(map.index_of(CanonicalColumn::Credit), Some(2));
    }

    #[test]
    fn test_noisy_headers_with_punctuation() {
        let map = ColumnMap::map_headers(&headers(&["Account #", "Debit ($)", "Credit ($)"]));
        assert_eq!(map.index_of(CanonicalColumn::AccountName), Some(0));
        assert_eq!(map.index_of(CanonicalColumn::Debit), Some(1));
        assert_eq!(map.index_of(CanonicalColumn::Credit), Some(2));
    }

    #[test]
    fn test_name_rule_defers_to_account() {
        // "name" claims the slot only when no "account" header claimed it
        // and the header itself does not contain "account".
        let map = ColumnMap::map_headers(&headers(&["Name", "Amount"]));
        assert_eq!(map.index_of(CanonicalColumn::AccountName), Some(0));
        assert_eq!(map.index_of(CanonicalColumn::Amount), Some(1));

        let map = ColumnMap::map_headers(&headers(&["Account", "Name", "Amount"]));
        assert_eq!(map.index_of(CanonicalColumn::AccountName), Some(0));
        // "Name" is left unmapped once the slot is claimed.
        assert_eq!(map.as_mapping().len(), 2);
    }

    #[test]
    fn test_amount_group_single_claim() {
        let map = ColumnMap::map_headers(&headers(&["Account", "Value", "Total"]));
        assert_eq!(map.index_of(CanonicalColumn::Amount), Some(1));
        assert_eq!(map.as_mapping().len(), 2);
    }

    #[test]
    fn test_unknown_headers_pass_through() {
        let map = ColumnMap::map_headers(&headers(&["Account", "Debit", "Credit", "Notes", "Ref"]));
        assert_eq!(map.as_mapping().len(), 3);
        assert_eq!(map.headers().len(), 5);
    }

    #[test]
    fn test_account_name_fallback_to_literal_headers() {
        // Two account-ish headers: the first claims the canonical slot, the
        // second stays unmapped but remains reachable as a literal.
        let map = ColumnMap::map_headers(&headers(&["Account Code", "Account"]));
        assert_eq!(map.index_of(CanonicalColumn::AccountName), Some(0));
        assert_eq!(map.account_name_index(), Some(0));

        let map = ColumnMap::map_headers(&headers(&["Ref", "Debit"]));
        assert_eq!(map.account_name_index(), None);
    }

    #[test]
    fn test_type_and_description() {
        let map = ColumnMap::map_headers(&headers(&["Account", "Amount", "Type", "Description"]));
        assert_eq!(map.index_of(CanonicalColumn::Type), Some(2));
        assert_eq!(map.index_of(CanonicalColumn::Description), Some(3));
    }
}
