//! Run orchestration: statement in, laid-out pages out

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{MappingSet, Settings};
use crate::ingest::Statement;
use crate::traits::*;
use crate::types::*;
use crate::voucher::{build_vouchers, layout, MappingMatcher};

/// Outcome of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Identifier attached to this run's log events
    pub run_id: Uuid,
    pub pages: Vec<Page>,
    /// Vouchers whose accounts came from the fallback pair
    pub fallback_count: usize,
    /// Statement rows that produced no voucher
    pub skipped_rows: usize,
    /// Non-zero rows among `skipped_rows` whose amount rounded to zero
    pub rounded_away_rows: usize,
}

impl RunReport {
    /// Vouchers across all pages, in number order
    pub fn vouchers(&self) -> impl Iterator<Item = &Voucher> {
        self.pages.iter().flat_map(|page| page.vouchers())
    }

    pub fn voucher_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Calculate total debits
    pub fn total_debits(&self) -> BigDecimal {
        self.vouchers().map(|v| &v.debit.amount).sum()
    }

    /// Calculate total credits
    pub fn total_credits(&self) -> BigDecimal {
        self.vouchers().map(|v| &v.credit.amount).sum()
    }

    /// Check if the run is balanced (debits = credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }
}

/// Turns statements into voucher pages for a fixed configuration
pub struct Pipeline<'a> {
    settings: &'a Settings,
    mappings: &'a MappingSet,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline, validating the settings up front
    pub fn new(settings: &'a Settings, mappings: &'a MappingSet) -> VoucherResult<Self> {
        settings.validate()?;
        Ok(Self { settings, mappings })
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Build and lay out every voucher of `statement`.
    ///
    /// Nothing is returned unless every row and the page geometry are valid.
    pub fn run(&self, statement: &Statement) -> VoucherResult<RunReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("voucher_run", %run_id);
        let _guard = span.enter();

        let fallback = self.settings.fallback();
        let matcher = MappingMatcher::new(&self.mappings.rules, &fallback);

        let vouchers = build_vouchers(
            &statement.transactions,
            &matcher,
            self.settings.start_number,
            self.settings.amount_precision,
        )?;

        let fallback_count = vouchers.iter().filter(|v| v.source.is_fallback()).count();
        let skipped_rows =
            statement.skipped_rows + (statement.transactions.len() - vouchers.len());
        let voucher_count = vouchers.len();
        let zero_rows = statement.transactions.iter().filter(|t| t.is_zero()).count();
        let rounded_away_rows = statement.transactions.len() - zero_rows - voucher_count;

        let pages = layout(vouchers, &self.settings.layout())?;

        if fallback_count > 0 {
            tracing::warn!(
                fallback_count,
                "some rows matched no mapping rule and use the fallback accounts"
            );
        }
        if rounded_away_rows > 0 {
            tracing::warn!(
                rounded_away_rows,
                precision = self.settings.amount_precision,
                "some non-zero rows rounded to zero and produced no voucher"
            );
        }
        tracing::info!(
            vouchers = voucher_count,
            pages = pages.len(),
            skipped_rows,
            "built vouchers"
        );

        Ok(RunReport {
            run_id,
            pages,
            fallback_count,
            skipped_rows,
            rounded_away_rows,
        })
    }

    /// Hand a finished run to a renderer
    pub fn render<R: VoucherRenderer + ?Sized>(
        &self,
        report: &RunReport,
        renderer: &mut R,
    ) -> VoucherResult<()> {
        let span = tracing::info_span!("voucher_render", run_id = %report.run_id);
        let _guard = span.enter();
        renderer.render(&report.pages, self.settings)
    }
}
