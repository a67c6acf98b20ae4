//! Run configuration and mapping-rule files

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::*;
use crate::utils::validation::*;
use crate::voucher::{shadowed_rules, LayoutSettings, A4_HEIGHT_MM, A4_WIDTH_MM};

/// Company name printed when none is configured
pub const DEFAULT_COMPANY_NAME: &str = "公司名称";

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub company_name: String,
    pub start_number: u32,
    pub vouchers_per_page: usize,
    pub amount_precision: u32,
    pub margin_mm: f64,
    pub spacing_mm: f64,
    pub page_height_mm: f64,
    pub page_width_mm: f64,
    /// Drop statement rows whose amounts are both zero while reading
    pub filter_zero_amounts: bool,
    pub fallback_debit_account: AccountRef,
    pub fallback_credit_account: AccountRef,
    /// TrueType font able to draw CJK text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            start_number: 1,
            vouchers_per_page: 3,
            amount_precision: 2,
            margin_mm: 12.0,
            spacing_mm: 6.0,
            page_height_mm: A4_HEIGHT_MM,
            page_width_mm: A4_WIDTH_MM,
            filter_zero_amounts: true,
            fallback_debit_account: AccountRef::default(),
            fallback_credit_account: AccountRef::default(),
            font_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> VoucherResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse settings from a JSON document
    pub fn from_json_str(data: &str) -> VoucherResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Check every option before any processing starts
    pub fn validate(&self) -> VoucherResult<()> {
        validate_start_number(self.start_number)?;
        validate_capacity(self.vouchers_per_page)?;
        validate_amount_precision(self.amount_precision)?;
        validate_positive_mm("margin_mm", self.margin_mm)?;
        validate_positive_mm("spacing_mm", self.spacing_mm)?;
        validate_positive_mm("page_height_mm", self.page_height_mm)?;
        validate_positive_mm("page_width_mm", self.page_width_mm)?;
        validate_fallback_account("fallback_debit_account", &self.fallback_debit_account)?;
        validate_fallback_account("fallback_credit_account", &self.fallback_credit_account)?;

        if self.fallback_debit_account.is_empty() || self.fallback_credit_account.is_empty() {
            tracing::warn!("fallback accounts are not fully configured; unmatched rows will print blank accounts");
        }

        // Geometry errors surface here rather than at render time.
        let layout = self.layout();
        layout.cell_height_mm()?;
        layout.cell_width_mm()?;
        Ok(())
    }

    /// Geometry used for multi-voucher sheets
    pub fn layout(&self) -> LayoutSettings {
        LayoutSettings::new(
            self.vouchers_per_page,
            self.margin_mm,
            self.spacing_mm,
            self.page_height_mm,
        )
        .with_page_width(self.page_width_mm)
    }

    /// Accounts used when no rule matches
    pub fn fallback(&self) -> AccountPair {
        AccountPair::new(
            self.fallback_debit_account.clone(),
            self.fallback_credit_account.clone(),
        )
    }

    /// Apply command-line overrides on top of file values
    pub fn with_overrides(mut self, start_number: Option<u32>, vouchers_per_page: Option<usize>) -> Self {
        if let Some(start_number) = start_number {
            self.start_number = start_number;
        }
        if let Some(vouchers_per_page) = vouchers_per_page {
            self.vouchers_per_page = vouchers_per_page;
        }
        self
    }
}

/// Rule as written in the mapping file; either leg may be omitted
#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    debit_account: Option<AccountRef>,
    #[serde(default)]
    credit_account: Option<AccountRef>,
}

/// Ordered keyword rules; position is priority
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingSet {
    pub rules: Vec<MappingRule>,
}

impl MappingSet {
    /// Create a mapping set from rules in priority order
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    /// Load rules from a JSON file; a missing file yields no rules
    pub fn load(path: impl AsRef<Path>, fallback: &AccountPair) -> VoucherResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "mapping file not found, every row will use fallback accounts");
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data, fallback)
    }

    /// Parse rules from a JSON array.
    ///
    /// Rules without a keyword are dropped. A rule missing one leg takes that
    /// leg from `fallback`.
    pub fn from_json_str(data: &str, fallback: &AccountPair) -> VoucherResult<Self> {
        let document: serde_json::Value = serde_json::from_str(data)?;
        if !document.is_array() {
            return Err(VoucherError::Config(
                "mapping file must contain a JSON array of rules".to_string(),
            ));
        }

        let raw: Vec<RawRule> = serde_json::from_value(document)?;
        let mut rules = Vec::with_capacity(raw.len());

        for (position, rule) in raw.into_iter().enumerate() {
            let keyword = rule.keyword.unwrap_or_default();
            if keyword.is_empty() {
                tracing::warn!(position, "ignoring mapping rule without a keyword");
                continue;
            }
            rules.push(MappingRule::new(
                keyword,
                rule.debit_account.unwrap_or_else(|| fallback.debit.clone()),
                rule.credit_account.unwrap_or_else(|| fallback.credit.clone()),
            ));
        }

        let set = Self::new(rules);
        set.warn_shadowed();
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn warn_shadowed(&self) {
        for shadowed in shadowed_rules(&self.rules) {
            tracing::warn!(
                rule = shadowed.index,
                keyword = %shadowed.keyword,
                earlier_rule = shadowed.shadowed_by,
                earlier_keyword = %shadowed.shadowed_by_keyword,
                "mapping rule can never match; an earlier keyword always matches first"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.start_number, 1);
        assert_eq!(settings.vouchers_per_page, 3);
        assert_eq!(settings.amount_precision, 2);
        assert_eq!(settings.margin_mm, 12.0);
        assert_eq!(settings.spacing_mm, 6.0);
        assert_eq!(settings.company_name, DEFAULT_COMPANY_NAME);
        assert!(settings.filter_zero_amounts);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json_str(
            r#"{
                "company_name": "示例科技有限公司",
                "vouchers_per_page": 2,
                "fallback_debit_account": "1002 银行存款",
                "fallback_credit_account": {"code": "2241", "name": "其他应付款"},
                "unknown_option": true
            }"#,
        )
        .unwrap();

        assert_eq!(settings.company_name, "示例科技有限公司");
        assert_eq!(settings.vouchers_per_page, 2);
        assert_eq!(settings.amount_precision, 2);
        assert_eq!(settings.fallback().debit, AccountRef::new("1002", "银行存款"));
        assert_eq!(settings.fallback().credit, AccountRef::new("2241", "其他应付款"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_capacity = Settings {
            vouchers_per_page: 4,
            ..Settings::default()
        };
        assert!(matches!(
            bad_capacity.validate(),
            Err(VoucherError::InvalidCapacity(4))
        ));

        let zero_start = Settings {
            start_number: 0,
            ..Settings::default()
        };
        assert!(matches!(zero_start.validate(), Err(VoucherError::Config(_))));

        let negative_margin = Settings {
            margin_mm: -3.0,
            ..Settings::default()
        };
        assert!(matches!(negative_margin.validate(), Err(VoucherError::Config(_))));

        let huge_precision = Settings::from_json_str(r#"{"amount_precision": 4294967295}"#).unwrap();
        assert!(matches!(huge_precision.validate(), Err(VoucherError::Config(_))));

        let overflow = Settings {
            margin_mm: 140.0,
            ..Settings::default()
        };
        assert!(matches!(
            overflow.validate(),
            Err(VoucherError::LayoutOverflow { .. })
        ));
    }

    #[test]
    fn test_negative_start_number_fails_to_parse() {
        assert!(matches!(
            Settings::from_json_str(r#"{"start_number": -1}"#),
            Err(VoucherError::Json(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default().with_overrides(Some(100), Some(2));
        assert_eq!(settings.start_number, 100);
        assert_eq!(settings.vouchers_per_page, 2);

        let untouched = Settings::default().with_overrides(None, None);
        assert_eq!(untouched, Settings::default());
    }

    #[test]
    fn test_mapping_rules_keep_order_and_inherit_fallback() {
        let fallback = AccountPair::new(
            AccountRef::parse("1002 银行存款"),
            AccountRef::parse("2241 其他应付款"),
        );
        let set = MappingSet::from_json_str(
            r#"[
                {"keyword": "工资", "debit_account": "2211 应付职工薪酬", "credit_account": "1002 银行存款"},
                {"keyword": "房租", "debit_account": "6602 管理费用"},
                {"keyword": "", "debit_account": "9999 无效"},
                {"debit_account": "9999 无效"}
            ]"#,
            &fallback,
        )
        .unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.rules[0].keyword, "工资");
        assert_eq!(set.rules[1].keyword, "房租");
        assert_eq!(set.rules[1].debit_account, AccountRef::new("6602", "管理费用"));
        assert_eq!(set.rules[1].credit_account, fallback.credit);
    }

    #[test]
    fn test_mapping_must_be_array() {
        let result = MappingSet::from_json_str(r#"{"keyword": "工资"}"#, &AccountPair::default());
        assert!(matches!(result, Err(VoucherError::Config(_))));
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings::load(dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());

        let set = MappingSet::load(dir.path().join("mapping.json"), &AccountPair::default()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"start_number": 12, "amount_precision": 0}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.start_number, 12);
        assert_eq!(settings.amount_precision, 0);
    }
}
