use crate::account::{Account, AccountId};
use crate::amount::Decimal;
use crate::balance::{aggregate, Balance, YearMonth};
use crate::config::ReportConfig;
use crate::ledger::Document;
use crate::section::{classify, find_section, Section, SectionEvent};
use crate::Result;

use serde::Serialize;
use tracing::debug;

use std::collections::BTreeMap;

/// One account row of a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountLine {
    pub id: AccountId,
    pub description: String,
    pub balance: Balance,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionReport {
    /// Position of the section in its configuration table.
    pub index: usize,
    pub name: String,
    pub lines: Vec<AccountLine>,
    pub subtotal: Balance,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryLine {
    pub name: String,
    /// Section index the summary is shown after.
    pub after: usize,
    pub balance: Balance,
}

/// Result report with revenue positive and costs negative.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IncomeStatement {
    pub months: Vec<YearMonth>,
    pub sections: Vec<SectionReport>,
    pub summaries: Vec<SummaryLine>,
    pub result: Balance,
    /// Equity at the end of every month, starting from the capital brought
    /// into the year.
    pub equity: BTreeMap<YearMonth, Decimal>,
}

/// Balance sheet row, from the declared opening and closing balances.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceLine {
    pub id: AccountId,
    pub description: String,
    pub opening: Decimal,
    /// Closing minus opening.
    pub period: Decimal,
    pub closing: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceSection {
    pub index: usize,
    pub name: String,
    pub lines: Vec<BalanceLine>,
    pub opening: Decimal,
    pub period: Decimal,
    pub closing: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceSheet {
    pub sections: Vec<BalanceSection>,
    /// Sum of the closing balances of every section. Zero when the books
    /// are closed.
    pub calculated_result: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VatReport {
    pub lines: Vec<AccountLine>,
    /// Negative when VAT is payable, positive when it is refundable.
    pub total: Decimal,
}

fn description(doc: &Document, id: &AccountId) -> String {
    doc.account(id)
        .map(|acc| acc.description.clone())
        .unwrap_or_default()
}

fn collect_sections(
    doc: &Document,
    sections: &[Section],
    events: Vec<SectionEvent<'_>>,
) -> (Vec<SectionReport>, Balance) {
    let mut reports: Vec<SectionReport> = Vec::new();
    let mut total = Balance::new();

    for event in events {
        match event {
            SectionEvent::SectionStart { section } => reports.push(SectionReport {
                index: section,
                name: sections[section].name.clone(),
                lines: Vec::new(),
                subtotal: Balance::new(),
            }),
            SectionEvent::Account { id, balance, .. } => {
                if let Some(report) = reports.last_mut() {
                    report.lines.push(AccountLine {
                        id: id.clone(),
                        description: description(doc, id),
                        balance: balance.clone(),
                    });
                }
            }
            SectionEvent::Subtotal { balance, .. } => {
                if let Some(report) = reports.last_mut() {
                    report.subtotal = balance;
                }
            }
            SectionEvent::GrandTotal { balance } => total = balance,
        }
    }

    (reports, total)
}

pub fn income_statement(doc: &Document, config: &ReportConfig) -> Result<IncomeStatement> {
    let raw = aggregate(doc)?;
    let balances = raw
        .iter()
        .map(|(id, balance)| Ok((id.clone(), balance.inverse()?)))
        .collect::<Result<BTreeMap<AccountId, Balance>>>()?;

    let events = classify(&config.income_statement, &balances)?;
    let (sections, result) = collect_sections(doc, &config.income_statement, events);

    let summaries = config
        .summaries
        .iter()
        .map(|summary| {
            let members = sections
                .iter()
                .filter(|s| summary.sections.contains(&s.index))
                .map(|s| &s.subtotal);
            Ok(SummaryLine {
                name: summary.name.clone(),
                after: summary.after,
                balance: Balance::try_sum(members)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let months = doc.months();
    let equity = equity_by_month(doc, config, &raw, &result, &months)?;

    debug!(
        company = %doc.company_name(),
        sections = sections.len(),
        result = %result.total(),
        "income statement"
    );

    Ok(IncomeStatement {
        months,
        sections,
        summaries,
        result,
        equity,
    })
}

/// Running equity: the negated opening balance of the equity accounts in
/// the first month, then each month's result and the negated movements on
/// the equity accounts in that month.
fn equity_by_month(
    doc: &Document,
    config: &ReportConfig,
    balances: &BTreeMap<AccountId, Balance>,
    result: &Balance,
    months: &[YearMonth],
) -> Result<BTreeMap<YearMonth, Decimal>> {
    let opening = Decimal::try_sum(
        config
            .equity_accounts
            .iter()
            .filter_map(|id| doc.account(id))
            .map(|acc| acc.opening_balance),
    )?;
    let mut running = opening.try_neg()?;

    let mut equity = BTreeMap::new();
    for &month in months {
        let moved = Decimal::try_sum(
            config
                .equity_accounts
                .iter()
                .filter_map(|id| balances.get(id))
                .map(|b| b.month(month)),
        )?;
        running = running
            .try_add(result.month(month))?
            .try_sub(moved)?;
        equity.insert(month, running);
    }
    Ok(equity)
}

/// Balance sheet over the declared opening (`#IB`) and closing (`#UB`)
/// balances. Accounts with both at zero are left out.
pub fn balance_sheet(doc: &Document, config: &ReportConfig) -> Result<BalanceSheet> {
    let mut accounts: Vec<&Account> = doc.accounts().iter().collect();
    accounts.sort_by(|a, b| a.id.cmp(&b.id));

    let mut sections: Vec<BalanceSection> = Vec::new();
    for acc in accounts {
        if acc.opening_balance.is_zero() && acc.closing_balance.is_zero() {
            continue;
        }
        let Some(index) = find_section(&config.balance_sheet, &acc.id) else {
            continue;
        };

        if sections.last().map(|s| s.index) != Some(index) {
            sections.push(BalanceSection {
                index,
                name: config.balance_sheet[index].name.clone(),
                lines: Vec::new(),
                opening: Decimal::ZERO,
                period: Decimal::ZERO,
                closing: Decimal::ZERO,
            });
        }
        let Some(section) = sections.last_mut() else {
            continue;
        };

        let period = acc.closing_balance.try_sub(acc.opening_balance)?;
        section.opening = section.opening.try_add(acc.opening_balance)?;
        section.period = section.period.try_add(period)?;
        section.closing = section.closing.try_add(acc.closing_balance)?;
        section.lines.push(BalanceLine {
            id: acc.id.clone(),
            description: acc.description.clone(),
            opening: acc.opening_balance,
            period,
            closing: acc.closing_balance,
        });
    }

    let calculated_result = Decimal::try_sum(sections.iter().map(|s| s.closing))?;
    debug!(
        company = %doc.company_name(),
        sections = sections.len(),
        result = %calculated_result,
        "balance sheet"
    );

    Ok(BalanceSheet {
        sections,
        calculated_result,
    })
}

pub fn vat(doc: &Document, config: &ReportConfig) -> Result<VatReport> {
    let sections = std::slice::from_ref(&config.vat);
    let lines: Vec<AccountLine> = aggregate(doc)?
        .into_iter()
        .filter(|(id, balance)| !balance.is_zero() && find_section(sections, id).is_some())
        .map(|(id, balance)| AccountLine {
            description: description(doc, &id),
            id,
            balance,
        })
        .collect();
    let total = Decimal::try_sum(lines.iter().map(|line| line.balance.total()))?;

    Ok(VatReport { lines, total })
}

/// Name of the view holding the entries without any annotation.
pub const OTHER_VIEW: &str = "(Other)";

/// Splits `doc` into one projection per annotation display name.
///
/// Annotations sharing a display name are merged into one view, and views
/// without entries are left out. When the document declares annotations an
/// [`OTHER_VIEW`] with the unannotated entries comes last.
pub fn annotation_views(doc: &Document) -> Vec<(String, Document)> {
    let mut views: Vec<(String, Document)> = Vec::new();

    for annotation in doc.annotations() {
        let projection = doc.copy_for_annotation(annotation);
        if projection.entries().is_empty() {
            continue;
        }

        let name = annotation.to_string();
        match views.iter_mut().find(|(n, _)| *n == name) {
            Some((_, view)) => view.add_entries_from(&projection),
            None => views.push((name, projection)),
        }
    }

    if !doc.annotations().is_empty() {
        views.push((OTHER_VIEW.to_string(), doc.copy_without_annotations()));
    }
    views
}

/// Income statement of every annotation view, computed in parallel.
pub fn annotated_income_statements(
    doc: &Document,
    config: &ReportConfig,
) -> Result<Vec<(String, IncomeStatement)>> {
    let views = annotation_views(doc);

    std::thread::scope(|scope| {
        let handles: Vec<_> = views
            .iter()
            .map(|(name, view)| {
                scope.spawn(move || {
                    income_statement(view, config).map(|report| (name.clone(), report))
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(report) => report,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Result<Vec<_>>>()
    })
}

#[cfg(test)]
mod tests {
    use crate::account::AccountId;
    use crate::amount::Decimal;
    use crate::balance::YearMonth;
    use crate::config::ReportConfig;
    use crate::parser::parse;
    use crate::report::{
        annotated_income_statements, annotation_views, balance_sheet, income_statement, vat,
        OTHER_VIEW,
    };
    use crate::SieError;

    use anyhow::Result;

    const LEDGER: &str = r#"#FNAMN "Kastelo AB"
#RAR 0 20160101 20161231
#OBJEKT 6 "P1" "Projekt ett"
#OBJEKT 6 "P2"
#KONTO 1930 "Företagskonto"
#KONTO 2081 "Aktiekapital"
#KONTO 2611 "Utgående moms 25%"
#KONTO 2641 "Ingående moms"
#KONTO 3010 "Försäljning"
#KONTO 5010 "Lokalhyra"
#KONTO 6310 "Företagsförsäkringar"
#IB 0 1930 50000.00
#IB 0 2081 -50000.00
#UB 0 1930 48793.00
#UB 0 2081 -50000.00
#UB 0 2611 -250.00
#UB 0 2641 100.00
#VER A 1 20160115 "Faktura"
{
#TRANS 1930 {} 1250.00
#TRANS 3010 {6 "P1"} -1000.00
#TRANS 2611 {} -250.00
}
#VER A 2 20160203 "Hyra"
{
#TRANS 1930 {} -500.00
#TRANS 5010 {6 "P2"} -400.00
#TRANS 5010 {} 800.00
#TRANS 2641 {} 100.00
}
#VER A 3 20160829 "Försäkring"
{
#TRANS 1930 {} -1957.00
#TRANS 6310 {} 1957.00
}
"#;

    fn units(amount: i64) -> Decimal {
        Decimal::from_cents(amount * 100)
    }

    #[test]
    fn income_statement_sections() -> Result<()> {
        let doc = parse(LEDGER)?;
        let report = income_statement(&doc, &ReportConfig::default())?;

        assert_eq!(report.months.len(), 12);
        let names: Vec<&str> = report.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Nettoomsättning", "Externa kostnader"]);

        let revenue = &report.sections[0];
        assert_eq!(revenue.subtotal.total(), units(1000));
        assert_eq!(revenue.lines[0].description, "Försäljning");
        assert_eq!(revenue.subtotal.month(YearMonth::new(2016, 1)), units(1000));

        let costs = &report.sections[1];
        assert_eq!(costs.lines.len(), 2);
        assert_eq!(costs.subtotal.total(), units(-2357));
        assert_eq!(report.result.total(), units(-1357));

        let summaries: Vec<(&str, Decimal)> = report
            .summaries
            .iter()
            .map(|s| (s.name.as_str(), s.balance.total()))
            .collect();
        assert_eq!(
            summaries,
            vec![
                ("Rörelsens intäkter", units(1000)),
                ("Rörelsens kostnader", units(-2357)),
                ("Rörelseresultat", units(-1357)),
            ]
        );
        Ok(())
    }

    #[test]
    fn equity_runs_from_opening_capital() -> Result<()> {
        let doc = parse(LEDGER)?;
        let report = income_statement(&doc, &ReportConfig::default())?;

        assert_eq!(report.equity.len(), 12);
        let month = |m: u32| report.equity[&YearMonth::new(2016, m)];
        assert_eq!(month(1), units(51000));
        assert_eq!(month(2), units(50600));
        assert_eq!(month(7), units(50600));
        assert_eq!(month(8), units(48643));
        assert_eq!(month(12), units(48643));
        Ok(())
    }

    #[test]
    fn equity_follows_capital_movements() -> Result<()> {
        let doc = parse(
            "#RAR 0 20160101 20160331\n\
             #KONTO 1930 Bank\n#KONTO 2091 Balanserat\n#KONTO 3010 Sales\n\
             #IB 0 2091 -1000\n\
             #VER A 1 20160210 x\n{\n#TRANS 1930 {} 300\n#TRANS 2091 {} -300\n}\n\
             #VER A 2 20160315 y\n{\n#TRANS 1930 {} 50\n#TRANS 3010 {} -50\n}",
        )?;
        let report = income_statement(&doc, &ReportConfig::default())?;

        let series: Vec<Decimal> = report.equity.values().copied().collect();
        assert_eq!(series, vec![units(1000), units(1300), units(1350)]);
        Ok(())
    }

    #[test]
    fn balance_sheet_opening_period_closing() -> Result<()> {
        let doc = parse(LEDGER)?;
        let config = ReportConfig::default();
        let sheet = balance_sheet(&doc, &config)?;

        assert_eq!(sheet.sections.len(), 2);
        let assets = &sheet.sections[0];
        assert_eq!(assets.name, "Tillgångar");
        assert_eq!(
            (assets.opening, assets.period, assets.closing),
            (units(50000), units(-1207), units(48793))
        );

        let liabilities = &sheet.sections[1];
        let ids: Vec<&str> = liabilities.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["2081", "2611", "2641"]);
        assert_eq!(liabilities.lines[0].period, Decimal::ZERO);
        assert_eq!(liabilities.lines[1].period, units(-250));
        assert_eq!(
            (liabilities.opening, liabilities.period, liabilities.closing),
            (units(-50000), units(-150), units(-50150))
        );

        assert_eq!(sheet.calculated_result, units(-1357));
        assert_eq!(
            sheet.calculated_result,
            income_statement(&doc, &config)?.result.total()
        );
        Ok(())
    }

    #[test]
    fn balance_sheet_skips_accounts_without_balances() -> Result<()> {
        let doc = parse("#KONTO 1510 Kundfordringar\n#KONTO 1930 Bank\n#UB 0 1930 10")?;
        let sheet = balance_sheet(&doc, &ReportConfig::default())?;

        assert_eq!(sheet.sections.len(), 1);
        assert_eq!(sheet.sections[0].lines.len(), 1);
        assert_eq!(sheet.sections[0].lines[0].id, AccountId::from("1930"));
        assert_eq!(sheet.sections[0].lines[0].period, units(10));
        Ok(())
    }

    #[test]
    fn vat_total() -> Result<()> {
        let doc = parse(LEDGER)?;
        let report = vat(&doc, &ReportConfig::default())?;

        let ids: Vec<&str> = report.lines.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["2611", "2641"]);
        assert_eq!(report.total, units(-150));
        Ok(())
    }

    #[test]
    fn inverting_smallest_amount_is_an_error() -> Result<()> {
        let doc = parse(
            "#KONTO 3010 Sales\n#VER A 1 20160101 x\n{\n#TRANS 3010 {} -92233720368547758.08\n}",
        )?;
        let err = income_statement(&doc, &ReportConfig::default()).unwrap_err();
        assert_eq!(err, SieError::Overflow);
        Ok(())
    }

    #[test]
    fn views_per_annotation() -> Result<()> {
        let doc = parse(LEDGER)?;
        let views = annotation_views(&doc);

        let names: Vec<&str> = views.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["P1 Projekt ett", "P2", OTHER_VIEW]);

        let ids = |idx: usize| -> Vec<String> {
            views[idx].1.entries().iter().map(|e| e.id.clone()).collect()
        };
        assert_eq!(ids(0), vec!["1"]);
        assert_eq!(ids(1), vec!["2"]);
        assert_eq!(ids(2), vec!["3"]);
        Ok(())
    }

    #[test]
    fn no_views_without_annotations() -> Result<()> {
        let doc = parse("#KONTO 3010 Sales\n#VER A 1 20160101 x\n{\n#TRANS 3010 {} -10\n}")?;
        assert!(annotation_views(&doc).is_empty());
        Ok(())
    }

    #[test]
    fn parallel_statements_match_sequential() -> Result<()> {
        let doc = parse(LEDGER)?;
        let config = ReportConfig::default();

        let parallel = annotated_income_statements(&doc, &config)?;
        let sequential = annotation_views(&doc)
            .into_iter()
            .map(|(name, view)| Ok((name, income_statement(&view, &config)?)))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(parallel, sequential);

        assert_eq!(parallel[0].1.result.total(), units(1000));
        Ok(())
    }
}
