use crate::account::{Account, AccountId};
use crate::config::{AccountOrder, ParseOptions};
use crate::directive::Directive;
use crate::ledger::{sort_annotations, sort_entries, Document};
use crate::tokenizer::split_fields;
use crate::transaction::{Entry, Transaction};
use crate::{Result, SieError};

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

/// Parses a whole SIE file, already decoded to text.
///
/// Reading the file and translating its character set (usually `PC8`) is
/// left to the caller.
pub fn parse(input: &str) -> Result<Document> {
    parse_lines(input.lines())
}

pub fn parse_lines<I, S>(lines: I) -> Result<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_lines_with(lines, ParseOptions::default())
}

pub fn parse_lines_with<I, S>(lines: I, options: ParseOptions) -> Result<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = DocumentParser::with_options(options);
    for line in lines {
        parser.feed_line(line.as_ref())?;
    }
    parser.finish()
}

/// Builds a [`Document`] one line at a time.
///
/// The first error aborts the parse; the parser should be dropped then.
#[derive(Default)]
pub struct DocumentParser {
    doc: Document,
    options: ParseOptions,
    accounts: IndexMap<AccountId, Account>,
    current: Option<(usize, Entry)>,
    fiscal_year: Option<(NaiveDate, NaiveDate)>,
    entry_span: Option<(NaiveDate, NaiveDate)>,
    line: usize,
}

impl DocumentParser {
    pub fn new() -> DocumentParser {
        Default::default()
    }

    pub fn with_options(options: ParseOptions) -> DocumentParser {
        DocumentParser {
            options,
            ..Default::default()
        }
    }

    /// Tokenizes and processes the next input line.
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.line += 1;
        let line_no = self.line;
        split_fields(line)
            .and_then(|fields| self.process_fields(&fields))
            .map_err(|e| e.at_line(line_no))
    }

    /// Processes the next line, already split into fields.
    pub fn feed_fields(&mut self, fields: &[String]) -> Result<()> {
        self.line += 1;
        let line_no = self.line;
        self.process_fields(fields).map_err(|e| e.at_line(line_no))
    }

    fn process_fields(&mut self, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.process_directive(Directive::decode(fields)?)
    }

    pub fn process_directive(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::Flag(flag) => self.doc.flag = Some(flag),
            Directive::Program { name, version } => {
                self.doc.program_name = name.to_string();
                self.doc.program_version = version.to_string();
            }
            Directive::Format(format) => self.doc.format = format.to_string(),
            Directive::Generated { date, author } => {
                self.doc.generated_at = date;
                self.doc.generated_by = author.unwrap_or_default().to_string();
            }
            Directive::SieType(kind) => self.doc.kind = kind.to_string(),
            Directive::OrgNo(org_no) => self.doc.org_no = org_no.to_string(),
            Directive::CompanyName(name) => self.doc.company_name = name.to_string(),
            Directive::AccountPlan(plan) => self.doc.account_plan = plan.to_string(),
            Directive::FiscalYear { starts, ends } => self.fiscal_year = Some((starts, ends)),
            Directive::Dimension { tag, name } => {
                self.doc.dimensions.insert(tag, name.to_string());
            }
            Directive::Account { id, description } => self.declare_account(id, description),
            Directive::AccountType { id, kind } => self.account_mut(&id)?.kind = kind.to_string(),
            Directive::OpeningBalance { id, amount } => {
                self.account_mut(&id)?.opening_balance = amount
            }
            Directive::ClosingBalance { id, amount } => {
                self.account_mut(&id)?.closing_balance = amount
            }
            Directive::EntryBegin {
                kind,
                id,
                date,
                description,
                filed,
            } => self.begin_entry(Entry {
                id: id.to_string(),
                kind: kind.to_string(),
                date,
                filed,
                description: description.to_string(),
                transactions: Vec::new(),
            })?,
            Directive::Transaction {
                account,
                amount,
                annotations,
            } => self.transaction(Transaction {
                account,
                amount,
                annotations,
            })?,
            Directive::Annotation(annotation) => self.doc.annotations.push(annotation),
            Directive::BlockOpen => {}
            Directive::EntryEnd => self.end_entry()?,
            Directive::Ignored(keyword) => {
                trace!(keyword = keyword, line = self.line, "ignored directive")
            }
        }

        Ok(())
    }

    fn declare_account(&mut self, id: AccountId, description: &str) {
        let account = Account::new(id.clone(), description);
        if self.accounts.insert(id.clone(), account).is_some() {
            warn!(account = %id, line = self.line, "account declared again, replacing it");
        }
    }

    fn account_mut(&mut self, id: &AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| SieError::UnknownAccount(id.to_string()))
    }

    fn begin_entry(&mut self, entry: Entry) -> Result<()> {
        if let Some((_, open)) = &self.current {
            return Err(SieError::UnterminatedEntry(open.id.clone()));
        }

        self.entry_span = Some(match self.entry_span {
            Some((first, last)) => (first.min(entry.date), last.max(entry.date)),
            None => (entry.date, entry.date),
        });
        self.current = Some((self.line, entry));
        Ok(())
    }

    fn transaction(&mut self, transaction: Transaction) -> Result<()> {
        if !self.accounts.contains_key(&transaction.account) {
            return Err(SieError::UnknownAccount(transaction.account.to_string()));
        }
        let (_, entry) = self
            .current
            .as_mut()
            .ok_or(SieError::TransactionOutsideEntry)?;
        entry.transactions.push(transaction);
        Ok(())
    }

    fn end_entry(&mut self) -> Result<()> {
        let (_, entry) = self.current.take().ok_or(SieError::UnexpectedTerminator)?;
        trace!(entry = %entry.id, transactions = entry.transactions.len(), "entry closed");
        self.doc.entries.push(entry);
        Ok(())
    }

    /// Checks that no entry is left open, orders the document and hands it
    /// over.
    pub fn finish(self) -> Result<Document> {
        let DocumentParser {
            mut doc,
            options,
            accounts,
            current,
            fiscal_year,
            entry_span,
            ..
        } = self;

        if let Some((line, entry)) = current {
            return Err(SieError::UnterminatedEntry(entry.id).at_line(line));
        }

        doc.accounts = accounts.into_values().collect();
        if options.account_order == AccountOrder::Natural {
            doc.accounts.sort_by(|a, b| a.id.cmp(&b.id));
        }
        sort_entries(&mut doc.entries);
        sort_annotations(&mut doc.annotations);

        if let Some((starts, ends)) = fiscal_year.or(entry_span) {
            doc.starts = Some(starts);
            doc.ends = Some(ends);
        }

        debug!(
            company = %doc.company_name,
            accounts = doc.accounts.len(),
            entries = doc.entries.len(),
            annotations = doc.annotations.len(),
            "document parsed"
        );
        Ok(doc)
    }
}
