use crate::{
    account::{natural_cmp, Account, AccountId},
    balance::YearMonth,
    transaction::{Annotation, Entry},
};

use chrono::NaiveDate;
use serde::Serialize;

use std::collections::BTreeMap;

/// A parsed SIE file.
///
/// Built once by [`parse`][crate::parse], read-only afterwards. Accounts are
/// unique by identifier, entries are ordered by date then identifier, and
/// annotations by tag then display text.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Document {
    pub(crate) flag: Option<u32>,
    pub(crate) program_name: String,
    pub(crate) program_version: String,
    pub(crate) format: String,
    pub(crate) generated_at: Option<NaiveDate>,
    pub(crate) generated_by: String,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) org_no: String,
    pub(crate) company_name: String,
    pub(crate) account_plan: String,
    pub(crate) accounts: Vec<Account>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) starts: Option<NaiveDate>,
    pub(crate) ends: Option<NaiveDate>,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) dimensions: BTreeMap<u32, String>,
}

impl Document {
    pub fn flag(&self) -> Option<u32> {
        self.flag
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn program_version(&self) -> &str {
        &self.program_version
    }

    /// Character set tag of the original file, e.g. `PC8`.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn generated_at(&self) -> Option<NaiveDate> {
        self.generated_at
    }

    pub fn generated_by(&self) -> &str {
        &self.generated_by
    }

    /// SIE file type (`1` to `4`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn org_no(&self) -> &str {
        &self.org_no
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn account_plan(&self) -> &str {
        &self.account_plan
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|acc| &acc.id == id)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn starts(&self) -> Option<NaiveDate> {
        self.starts
    }

    pub fn ends(&self) -> Option<NaiveDate> {
        self.ends
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn dimension_name(&self, tag: u32) -> Option<&str> {
        self.dimensions.get(&tag).map(String::as_str)
    }

    /// Every month touched by the fiscal period, first to last.
    pub fn months(&self) -> Vec<YearMonth> {
        let (Some(starts), Some(ends)) = (self.starts, self.ends) else {
            return Vec::new();
        };

        let last = YearMonth::from(ends);
        let mut month = YearMonth::from(starts);
        let mut months = Vec::new();
        while month <= last {
            months.push(month);
            month = month.next();
        }
        months
    }

    /// Copy holding only the entries where at least one transaction carries
    /// `annotation`.
    pub fn copy_for_annotation(&self, annotation: &Annotation) -> Document {
        self.copy_with_entries(|entry| entry.has_annotation(annotation))
    }

    /// Copy holding only the entries none of whose transactions is annotated.
    pub fn copy_without_annotations(&self) -> Document {
        self.copy_with_entries(|entry| !entry.is_annotated())
    }

    fn copy_with_entries<F: Fn(&Entry) -> bool>(&self, keep: F) -> Document {
        Document {
            entries: self.entries.iter().filter(|e| keep(e)).cloned().collect(),
            ..self.clone_header()
        }
    }

    fn clone_header(&self) -> Document {
        Document {
            flag: self.flag,
            program_name: self.program_name.clone(),
            program_version: self.program_version.clone(),
            format: self.format.clone(),
            generated_at: self.generated_at,
            generated_by: self.generated_by.clone(),
            kind: self.kind.clone(),
            org_no: self.org_no.clone(),
            company_name: self.company_name.clone(),
            account_plan: self.account_plan.clone(),
            accounts: self.accounts.clone(),
            entries: Vec::new(),
            starts: self.starts,
            ends: self.ends,
            annotations: self.annotations.clone(),
            dimensions: self.dimensions.clone(),
        }
    }

    /// Adds the entries of `other` that this document does not hold yet,
    /// keeping entries ordered.
    pub fn add_entries_from(&mut self, other: &Document) {
        for entry in &other.entries {
            if !self.entries.contains(entry) {
                self.entries.push(entry.clone());
            }
        }
        sort_entries(&mut self.entries);
    }
}

pub(crate) fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| natural_cmp(&a.id, &b.id)));
}

pub(crate) fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by(|a, b| {
        a.tag
            .cmp(&b.tag)
            .then_with(|| a.to_string().cmp(&b.to_string()))
    });
}
