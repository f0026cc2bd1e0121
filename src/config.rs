use crate::model::ExtractionRule;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm"];

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "cellmap",
    about = "Rule-driven extraction of flat records from spreadsheet workbooks",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CELLMAP_WORKBOOK",
        value_name = "FILE",
        help = "Workbook to extract records from"
    )]
    pub workbook: Option<PathBuf>,

    #[arg(
        long,
        env = "CELLMAP_RULES",
        value_name = "FILE",
        help = "Rule file (YAML or JSON, holding one rule or a list)"
    )]
    pub rules: Option<PathBuf>,

    #[arg(
        long,
        env = "CELLMAP_SHEET",
        value_name = "NAME",
        help = "Sheet name override applied to every sheet rule"
    )]
    pub sheet: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Write result JSON to this file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Print the JSON Schema of the rule file format and exit")]
    pub emit_rule_schema: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workbook: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub sheet_override: Option<String>,
    pub output: Option<PathBuf>,
    pub emit_rule_schema: bool,
}

impl AppConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            workbook: cli_workbook,
            rules: cli_rules,
            sheet: cli_sheet,
            output: cli_output,
            emit_rule_schema,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            workbook: file_workbook,
            rules: file_rules,
            sheet: file_sheet,
            output: file_output,
        } = file_config;

        let config = Self {
            workbook: cli_workbook.or(file_workbook),
            rules: cli_rules.or(file_rules),
            sheet_override: cli_sheet.or(file_sheet).filter(|name| !name.is_empty()),
            output: cli_output.or(file_output),
            emit_rule_schema,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.emit_rule_schema {
            return Ok(());
        }

        let workbook = self
            .workbook
            .as_ref()
            .context("a workbook path is required (--workbook)")?;
        anyhow::ensure!(workbook.exists(), "workbook {:?} does not exist", workbook);
        anyhow::ensure!(workbook.is_file(), "workbook {:?} is not a file", workbook);
        let allowed = workbook
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        anyhow::ensure!(
            allowed,
            "workbook {:?} does not match supported extensions {:?}",
            workbook,
            SUPPORTED_EXTENSIONS
        );

        let rules = self
            .rules
            .as_ref()
            .context("a rule file path is required (--rules)")?;
        anyhow::ensure!(rules.exists(), "rule file {:?} does not exist", rules);

        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    workbook: Option<PathBuf>,
    rules: Option<PathBuf>,
    sheet: Option<String>,
    output: Option<PathBuf>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}

/// A rule file may hold one rule object or a list of rules.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleFile {
    Many(Vec<ExtractionRule>),
    One(Box<ExtractionRule>),
}

pub fn load_rules(path: &Path) -> Result<Vec<ExtractionRule>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read rule file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed: RuleFile = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML rule file {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON rule file {:?}", path))?,
        other => anyhow::bail!("unsupported rule file extension: {other}"),
    };

    Ok(match parsed {
        RuleFile::Many(rules) => rules,
        RuleFile::One(rule) => vec![*rule],
    })
}
