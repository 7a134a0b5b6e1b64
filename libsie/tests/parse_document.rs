use libsie::balance::aggregate;
use libsie::{parse, AccountId, Decimal, SieError};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

const TESTDATA: &str = include_str!("testdata/testdata.se");

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(anyhow!("invalid date"))
}

#[test]
fn parse_testdata() -> Result<()> {
    let doc = parse(TESTDATA)?;

    assert_eq!(doc.flag(), Some(0));
    assert_eq!(doc.program_name(), "SpeedLedger e-bokföring");
    assert_eq!(doc.program_version(), "2.0");
    assert_eq!(doc.format(), "PC8");
    assert_eq!(doc.generated_at(), Some(date(2017, 3, 5)?));
    assert_eq!(doc.generated_by(), "Jakob Borg");
    assert_eq!(doc.kind(), "4");
    assert_eq!(doc.org_no(), "123456-7890");
    assert_eq!(doc.company_name(), "Kastelo AB");
    assert_eq!(doc.account_plan(), "EUBAS97");
    assert_eq!(doc.starts(), Some(date(2016, 1, 2)?));
    assert_eq!(doc.ends(), Some(date(2016, 8, 29)?));

    let accounts: Vec<(&str, &str, &str, Decimal)> = doc
        .accounts()
        .iter()
        .map(|a| {
            (
                a.id.as_str(),
                a.kind.as_str(),
                a.description.as_str(),
                a.closing_balance,
            )
        })
        .collect();
    assert_eq!(
        accounts,
        vec![
            ("1930", "T", "Bankkonto", Decimal::from_cents(4_804_300)),
            ("2081", "S", "Aktiekapital", Decimal::from_cents(-5_000_000)),
            ("6310", "K", "Försäkringar", Decimal::from_cents(195_700)),
        ]
    );

    let entries: Vec<(&str, NaiveDate, &str)> = doc
        .entries()
        .iter()
        .map(|e| (e.id.as_str(), e.date, e.description.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("1", date(2016, 1, 2)?, "Aktiekapital"),
            ("2", date(2016, 8, 29)?, "Försäkring F"),
        ]
    );
    assert_eq!(doc.entries()[1].filed, Some(date(2017, 3, 5)?));
    for entry in doc.entries() {
        assert!(entry.net()?.is_zero(), "entry {}", entry.id);
    }
    Ok(())
}

#[test]
fn balances_match_closing_balances() -> Result<()> {
    let doc = parse(TESTDATA)?;
    let balances = aggregate(&doc)?;

    for account in doc.accounts() {
        let balance = balances
            .get(&account.id)
            .ok_or(anyhow!("no balance for {}", account.id))?;
        assert_eq!(balance.total(), account.closing_balance, "{}", account.id);
    }

    let bank = &balances[&AccountId::from("1930")];
    assert_eq!(bank.months().len(), 2);
    Ok(())
}

#[test]
fn export_json() -> Result<()> {
    let doc = parse(TESTDATA)?;
    let json = serde_json::to_value(&doc)?;

    assert_eq!(json["company_name"], "Kastelo AB");
    assert_eq!(json["accounts"][0]["type"], "T");
    assert_eq!(json["accounts"][0]["closing_balance"], "48043.00");
    assert_eq!(json["entries"][1]["date"], "2016-08-29");
    Ok(())
}

#[test]
fn reject_unknown_account() {
    let input = TESTDATA.replace("#TRANS 6310", "#TRANS 6311");
    let err = parse(&input).unwrap_err();

    assert_eq!(err.root(), &SieError::UnknownAccount("6311".to_string()));
    assert_eq!(err.line(), Some(28));
}
