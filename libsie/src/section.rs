use crate::{account::AccountId, balance::Balance, Result};
use serde::{Deserialize, Serialize};

/// Named, inclusive range of account numbers, e.g. revenue is 3000-3799.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl Section {
    pub fn new(name: impl Into<String>, start: u32, end: u32) -> Self {
        Section {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, number: u32) -> bool {
        self.start <= number && number <= self.end
    }

    pub fn overlaps(&self, other: &Section) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Index of the first section holding `id`, if any.
pub fn find_section(sections: &[Section], id: &AccountId) -> Option<usize> {
    let number = id.class_number()?;
    sections.iter().position(|s| s.contains(number))
}

#[derive(Clone, Debug, PartialEq)]
pub enum SectionEvent<'a> {
    SectionStart {
        section: usize,
    },
    Account {
        section: usize,
        id: &'a AccountId,
        balance: &'a Balance,
    },
    /// Sum of every account of the section that just ended.
    Subtotal {
        section: usize,
        balance: Balance,
    },
    /// Sum of every subtotal, emitted once at the very end.
    GrandTotal {
        balance: Balance,
    },
}

/// Walks accounts in identifier order and splits them into sections.
///
/// Accounts with a zero total, or outside every section, are skipped. A
/// subtotal is emitted each time the section changes and once more when the
/// walk is finished, followed by the grand total. Balances are taken as
/// given: flipping the sign of revenue and cost accounts is up to the caller.
pub struct SectionClassifier<'c, 'a> {
    sections: &'c [Section],
    current: Option<usize>,
    subtotal: Balance,
    grand_total: Balance,
    events: Vec<SectionEvent<'a>>,
}

impl<'c, 'a> SectionClassifier<'c, 'a> {
    pub fn new(sections: &'c [Section]) -> Self {
        SectionClassifier {
            sections,
            current: None,
            subtotal: Balance::new(),
            grand_total: Balance::new(),
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, id: &'a AccountId, balance: &'a Balance) -> Result<()> {
        if balance.is_zero() {
            return Ok(());
        }
        let Some(section) = find_section(self.sections, id) else {
            return Ok(());
        };

        if self.current != Some(section) {
            self.close_section()?;
            self.events.push(SectionEvent::SectionStart { section });
            self.current = Some(section);
        }

        self.subtotal.add_all(balance)?;
        self.events.push(SectionEvent::Account {
            section,
            id,
            balance,
        });
        Ok(())
    }

    fn close_section(&mut self) -> Result<()> {
        if let Some(section) = self.current.take() {
            let balance = std::mem::take(&mut self.subtotal);
            self.grand_total.add_all(&balance)?;
            self.events.push(SectionEvent::Subtotal { section, balance });
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<SectionEvent<'a>>> {
        self.close_section()?;
        let balance = std::mem::take(&mut self.grand_total);
        self.events.push(SectionEvent::GrandTotal { balance });
        Ok(self.events)
    }
}

/// Runs a [`SectionClassifier`] over `accounts`, which must come in
/// ascending identifier order.
pub fn classify<'a, I>(sections: &[Section], accounts: I) -> Result<Vec<SectionEvent<'a>>>
where
    I: IntoIterator<Item = (&'a AccountId, &'a Balance)>,
{
    let mut classifier = SectionClassifier::new(sections);
    for (id, balance) in accounts {
        classifier.push(id, balance)?;
    }
    classifier.finish()
}
