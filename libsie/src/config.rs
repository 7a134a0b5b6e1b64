use crate::account::AccountId;
use crate::section::Section;
use crate::{Result, SieError};
use serde::{Deserialize, Serialize};

/// How the parsed document orders its accounts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountOrder {
    /// By identifier, numeric identifiers by value.
    #[default]
    Natural,
    /// As declared in the file.
    Declaration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub account_order: AccountOrder,
}

/// Total over a group of income statement sections, shown after the
/// section at `after`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub sections: Vec<usize>,
    pub after: usize,
}

impl Summary {
    fn new(name: &str, sections: &[usize], after: usize) -> Self {
        Summary {
            name: name.to_string(),
            sections: sections.to_vec(),
            after,
        }
    }
}

/// Account ranges the reports classify by. Defaults follow the Swedish BAS
/// chart of accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub income_statement: Vec<Section>,
    pub summaries: Vec<Summary>,
    pub balance_sheet: Vec<Section>,
    pub vat: Section,
    /// Accounts whose movements feed the equity line of the income
    /// statement.
    pub equity_accounts: Vec<AccountId>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            income_statement: vec![
                Section::new("Nettoomsättning", 3000, 3799),
                Section::new("Aktiverat arbete för egen räkning", 3800, 3899),
                Section::new("Övriga rörelseintäkter", 3900, 3999),
                Section::new("Varukostnader", 4000, 4999),
                Section::new("Externa kostnader", 5000, 6999),
                Section::new("Personalkostnader", 7000, 7699),
                Section::new("Av- och nedskrivningar", 7700, 7899),
                Section::new("Övriga rörelsekostnader", 7900, 7999),
                Section::new("Finansiella poster", 8000, 8998),
            ],
            summaries: vec![
                Summary::new("Rörelsens intäkter", &[0, 1, 2], 2),
                Summary::new("Rörelsens kostnader", &[3, 4, 5], 5),
                Summary::new("Rörelseresultat", &[0, 1, 2, 3, 4, 5], 5),
            ],
            balance_sheet: vec![
                Section::new("Tillgångar", 1000, 1999),
                Section::new("Eget kapital, skulder", 2000, 2999),
            ],
            vat: Section::new("Moms", 2600, 2699),
            equity_accounts: vec![AccountId::from("2081"), AccountId::from("2091")],
        }
    }
}

impl ReportConfig {
    /// Reads a configuration from JSON. Missing tables keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ReportConfig =
            serde_json::from_str(json).map_err(|e| SieError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Ranges must be well formed and must not overlap within a table, and
    /// summaries must point at existing sections.
    pub fn validate(&self) -> Result<()> {
        for table in [&self.income_statement, &self.balance_sheet] {
            validate_sections(table)?;
        }
        validate_sections(std::slice::from_ref(&self.vat))?;

        let count = self.income_statement.len();
        for summary in &self.summaries {
            if summary.after >= count || summary.sections.iter().any(|&idx| idx >= count) {
                return Err(SieError::Config(format!(
                    "summary `{}' refers to a missing section",
                    summary.name
                )));
            }
        }
        Ok(())
    }
}

fn validate_sections(sections: &[Section]) -> Result<()> {
    for (idx, section) in sections.iter().enumerate() {
        if section.start > section.end {
            return Err(SieError::Config(format!(
                "section `{}' ends before it starts",
                section.name
            )));
        }
        if let Some(other) = sections[..idx].iter().find(|o| o.overlaps(section)) {
            return Err(SieError::Config(format!(
                "sections `{}' and `{}' overlap",
                other.name, section.name
            )));
        }
    }
    Ok(())
}
