use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use voucher_core::ingest::read_statement;
use voucher_core::render::{PdfRenderer, SingleVoucherPdfRenderer};
use voucher_core::{init_tracing, MappingSet, Pipeline, Settings, VoucherResult};

/// 银行流水生成记账凭证
#[derive(Parser, Debug)]
#[command(name = "bank-vouchers", version, about = "Generate accounting vouchers from a bank statement CSV")]
struct Cli {
    /// Bank statement CSV
    #[arg(long)]
    input: PathBuf,

    /// Combined PDF output path
    #[arg(long, default_value = "output/vouchers.pdf")]
    output: PathBuf,

    /// Keyword to account mapping rules (JSON array)
    #[arg(long, default_value = "mapping.json")]
    mapping: PathBuf,

    /// Settings file (JSON)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Also write one PDF per voucher into <output dir>/single
    #[arg(long)]
    single: bool,

    /// First voucher number (overrides the settings file)
    #[arg(long)]
    start_number: Option<u32>,

    /// Vouchers per sheet (overrides the settings file)
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=3))]
    vouchers_per_page: Option<u8>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "voucher generation failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> VoucherResult<()> {
    let settings = Settings::load(&cli.config)?
        .with_overrides(cli.start_number, cli.vouchers_per_page.map(usize::from));
    let mappings = MappingSet::load(&cli.mapping, &settings.fallback())?;
    let pipeline = Pipeline::new(&settings, &mappings)?;

    let statement = read_statement(&cli.input, settings.filter_zero_amounts)?;
    let report = pipeline.run(&statement)?;

    if report.rounded_away_rows > 0 {
        println!(
            "{} 条非零流水按 {} 位小数舍入后为零，未生成凭证。",
            report.rounded_away_rows, settings.amount_precision
        );
    }

    if report.is_empty() {
        println!("没有需要生成的凭证，检查 CSV 内容或过滤规则。");
        return Ok(());
    }

    pipeline.render(&report, &mut PdfRenderer::new(&cli.output))?;
    println!("已生成汇总 PDF：{}", cli.output.display());

    if cli.single {
        let single_dir = cli
            .output
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("single");
        pipeline.render(&report, &mut SingleVoucherPdfRenderer::new(&single_dir))?;
        println!("已生成单张凭证 PDF 至：{}", single_dir.display());
    }

    if report.fallback_count > 0 {
        println!(
            "{} 条流水未匹配映射规则，已使用默认科目。",
            report.fallback_count
        );
    }

    Ok(())
}
