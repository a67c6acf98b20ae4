//! Basic voucher generation example

use voucher_core::ingest::parse_statement;
use voucher_core::utils::RecordingRenderer;
use voucher_core::{init_tracing, AccountRef, MappingSet, Pipeline, Settings};

const STATEMENT: &str = "交易日期,摘要,借方金额,贷方金额\n\
    2024-03-01,三月工资发放,,48200.00\n\
    2024-03-02,房租 3月,,\"6,500.00\"\n\
    2024-03-05,客户回款 A公司,23000.00,\n\
    2024-03-06,银行手续费,,15.50\n\
    2024-03-07,利息收入,3.215,\n";

const MAPPING: &str = r#"[
    {"keyword": "工资", "debit_account": "2211 应付职工薪酬", "credit_account": "1002 银行存款"},
    {"keyword": "房租", "debit_account": "6602 管理费用-房租", "credit_account": "1002 银行存款"},
    {"keyword": "回款", "debit_account": "1002 银行存款", "credit_account": "1122 应收账款"},
    {"keyword": "手续费", "debit_account": "6603 财务费用", "credit_account": "1002 银行存款"}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("🧾 Voucher Core - Basic Voucher Example\n");

    let settings = Settings {
        company_name: "示例科技有限公司".to_string(),
        start_number: 101,
        fallback_debit_account: AccountRef::parse("1002 银行存款"),
        fallback_credit_account: AccountRef::parse("6603 财务费用"),
        ..Settings::default()
    };
    let mappings = MappingSet::from_json_str(MAPPING, &settings.fallback())?;
    println!("📋 Loaded {} mapping rules", mappings.len());

    let statement = parse_statement(STATEMENT, settings.filter_zero_amounts)?;
    println!("🏦 Read {} statement rows\n", statement.transactions.len());

    let pipeline = Pipeline::new(&settings, &mappings)?;
    let report = pipeline.run(&statement)?;

    for page in &report.pages {
        println!(
            "📄 Sheet {} ({} of {} slots, cell height {:.1} mm)",
            page.index + 1,
            page.len(),
            page.capacity,
            page.cell_height_mm
        );
        for placement in &page.placements {
            let voucher = &placement.voucher;
            let marker = if voucher.source.is_fallback() {
                " [fallback]"
            } else {
                ""
            };
            println!(
                "  记-{} {} {}  借 {} / 贷 {}  {}{}",
                voucher.formatted_number(),
                voucher.formatted_date(),
                voucher.display_description(),
                voucher.debit.account,
                voucher.credit.account,
                voucher.formatted_amount(),
                marker
            );
        }
    }

    println!();
    println!("💰 Total debits:  {}", report.total_debits());
    println!("💰 Total credits: {}", report.total_credits());
    println!("⚖️  Balanced: {}", report.is_balanced());
    println!("🔁 Fallback vouchers: {}", report.fallback_count);

    let mut renderer = RecordingRenderer::new();
    pipeline.render(&report, &mut renderer)?;
    println!("🖨️  Rendered {} sheets", renderer.pages().len());

    Ok(())
}
