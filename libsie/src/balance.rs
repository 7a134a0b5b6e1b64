use crate::{account::AccountId, amount::Decimal, ledger::Document};
use crate::Result;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use std::collections::BTreeMap;
use std::fmt;

/// Calendar month key, displayed as `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    pub fn next(self) -> Self {
        if self.month >= 12 {
            YearMonth::new(self.year + 1, 1)
        } else {
            YearMonth::new(self.year, self.month + 1)
        }
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        YearMonth::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Running total of an account (or a group of accounts), broken down by
/// month.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balance {
    total: Decimal,
    months: BTreeMap<YearMonth, Decimal>,
}

impl Balance {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Amount booked in `month`, zero when nothing was.
    pub fn month(&self, month: YearMonth) -> Decimal {
        self.months.get(&month).copied().unwrap_or_default()
    }

    pub fn months(&self) -> &BTreeMap<YearMonth, Decimal> {
        &self.months
    }

    pub fn is_zero(&self) -> bool {
        self.total.is_zero()
    }

    /// Books `amount` at `date`. The balance is left untouched when the total
    /// or the month would overflow.
    pub fn add(&mut self, date: NaiveDate, amount: Decimal) -> Result<()> {
        let month = YearMonth::from(date);
        let total = self.total.try_add(amount)?;
        let bucket = self.month(month).try_add(amount)?;
        self.total = total;
        self.months.insert(month, bucket);
        Ok(())
    }

    /// Opening balances count toward the total but belong to no month.
    pub fn add_opening(&mut self, amount: Decimal) -> Result<()> {
        self.total = self.total.try_add(amount)?;
        Ok(())
    }

    /// Copy with the sign of the total and of every month flipped.
    pub fn inverse(&self) -> Result<Balance> {
        let months = self
            .months
            .iter()
            .map(|(&month, &amount)| Ok((month, amount.try_neg()?)))
            .collect::<Result<_>>()?;
        Ok(Balance {
            total: self.total.try_neg()?,
            months,
        })
    }

    pub fn add_all(&mut self, other: &Balance) -> Result<()> {
        let total = self.total.try_add(other.total)?;
        let mut months = self.months.clone();
        for (&month, &amount) in &other.months {
            let bucket = months.entry(month).or_default();
            *bucket = bucket.try_add(amount)?;
        }
        self.total = total;
        self.months = months;
        Ok(())
    }

    /// Merges every balance of `balances` into a new one.
    pub fn try_sum<'a, I>(balances: I) -> Result<Balance>
    where
        I: IntoIterator<Item = &'a Balance>,
    {
        balances.into_iter().try_fold(Balance::new(), |mut acc, b| {
            acc.add_all(b)?;
            Ok(acc)
        })
    }
}

/// Balance of every account in `doc`, keyed and ordered by identifier.
///
/// Opening balances are taken first, then every transaction at the date of
/// its entry, in document order.
pub fn aggregate(doc: &Document) -> Result<BTreeMap<AccountId, Balance>> {
    let mut balances = BTreeMap::new();
    for acc in doc.accounts() {
        let mut balance = Balance::new();
        balance.add_opening(acc.opening_balance)?;
        balances.insert(acc.id.clone(), balance);
    }

    for entry in doc.entries() {
        for txn in &entry.transactions {
            balances
                .entry(txn.account.clone())
                .or_insert_with(Balance::new)
                .add(entry.date, txn.amount)?;
        }
    }

    Ok(balances)
}
