//! Keyword classification of bank descriptions
//!
//! Rules are scanned in configuration order and the first rule whose keyword
//! occurs in the description wins. A longer keyword listed after a shorter
//! one it contains can therefore never match; [`shadowed_rules`] reports such
//! rules so the rule author can reorder them.

use crate::traits::AccountResolver;
use crate::types::*;

/// Resolve a description to a `(debit, credit)` account pair.
///
/// Returns the accounts of the first rule whose keyword is a case-sensitive
/// substring of `description`, or the fallback pair when none matches.
pub fn match_accounts(
    description: &str,
    rules: &[MappingRule],
    fallback: &AccountPair,
) -> (AccountRef, AccountRef) {
    MappingMatcher::new(rules, fallback)
        .resolve(description)
        .accounts
        .into_tuple()
}

/// Borrowed view over an ordered rule set plus its fallback accounts
#[derive(Debug, Clone, Copy)]
pub struct MappingMatcher<'a> {
    rules: &'a [MappingRule],
    fallback: &'a AccountPair,
}

impl<'a> MappingMatcher<'a> {
    /// Create a matcher over `rules`, in priority order
    pub fn new(rules: &'a [MappingRule], fallback: &'a AccountPair) -> Self {
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &'a [MappingRule] {
        self.rules
    }

    pub fn fallback(&self) -> &'a AccountPair {
        self.fallback
    }

    /// Find the first rule matching `description`, with its position
    pub fn find_rule(&self, description: &str) -> Option<(usize, &'a MappingRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| !rule.keyword.is_empty() && description.contains(&rule.keyword))
    }
}

impl AccountResolver for MappingMatcher<'_> {
    fn resolve(&self, description: &str) -> AccountMatch {
        match self.find_rule(description) {
            Some((index, rule)) => AccountMatch {
                accounts: AccountPair::new(rule.debit_account.clone(), rule.credit_account.clone()),
                source: MatchSource::Rule {
                    index,
                    keyword: rule.keyword.clone(),
                },
            },
            None => AccountMatch {
                accounts: self.fallback.clone(),
                source: MatchSource::Fallback,
            },
        }
    }
}

/// A rule that an earlier rule always pre-empts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedRule {
    pub index: usize,
    pub keyword: String,
    pub shadowed_by: usize,
    pub shadowed_by_keyword: String,
}

/// List rules that can never match because an earlier keyword is a
/// substring of theirs.
pub fn shadowed_rules(rules: &[MappingRule]) -> Vec<ShadowedRule> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| !rule.keyword.is_empty())
        .filter_map(|(index, rule)| {
            rules[..index]
                .iter()
                .position(|earlier| {
                    !earlier.keyword.is_empty() && rule.keyword.contains(&earlier.keyword)
                })
                .map(|shadowed_by| ShadowedRule {
                    index,
                    keyword: rule.keyword.clone(),
                    shadowed_by,
                    shadowed_by_keyword: rules[shadowed_by].keyword.clone(),
                })
        })
        .collect()
}
