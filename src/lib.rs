pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod process;
pub mod utils;
pub mod workbook;

pub use config::{AppConfig, CliArgs, load_rules};
pub use error::EngineError;
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use model::{
    ExtractionRule, FieldValue, GeneratedRecord, MappingRule, ProcessingResult, SheetRule,
};
pub use process::{BatchProgress, process_batch, process_rule};
pub use workbook::WorkbookData;

use anyhow::{Context, Result};

/// CLI flow: load workbook and rules, run one invocation or a batch, and
/// write the result JSON.
pub fn run(config: AppConfig) -> Result<()> {
    if config.emit_rule_schema {
        let schema = schemars::schema_for!(model::ExtractionRule);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let workbook_path = config
        .workbook
        .as_ref()
        .context("a workbook path is required")?;
    let rules_path = config
        .rules
        .as_ref()
        .context("a rule file path is required")?;

    let workbook = WorkbookData::load(workbook_path)?;
    let rules = load_rules(rules_path)?;
    anyhow::ensure!(
        !rules.is_empty(),
        "rule file {:?} contains no rules",
        rules_path
    );

    let file_name = workbook_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "workbook".to_string());

    tracing::info!(
        workbook = %workbook_path.display(),
        sheets = workbook.sheet_count(),
        rules = rules.len(),
        "starting extraction"
    );

    let selected_sheet = config.sheet_override.as_deref();
    let single = rules.len() == 1;
    let results = if single {
        vec![process_rule(&workbook, &file_name, &rules[0], selected_sheet)]
    } else {
        process_batch(&workbook, &file_name, &rules, selected_sheet, |progress| {
            tracing::info!(
                current = progress.current,
                total = progress.total,
                rule = progress.rule_name,
                "batch progress"
            );
        })
    };

    let rendered = if single {
        serde_json::to_string_pretty(&results[0])?
    } else {
        serde_json::to_string_pretty(&results)?
    };

    match config.output.as_ref() {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write results to {:?}", path))?,
        None => println!("{}", rendered),
    }

    let failed = results.iter().filter(|result| !result.success).count();
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), "some rules failed");
    }
    // A lone failed rule is a failed run; batch invocations keep failure
    // isolation and report through the result list instead.
    if single && failed > 0 {
        let message = results[0]
            .error_message
            .clone()
            .unwrap_or_else(|| "processing failed".to_string());
        anyhow::bail!("rule \"{}\" failed: {}", rules[0].name, message);
    }

    Ok(())
}
