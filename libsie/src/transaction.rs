use crate::account::AccountId;
use crate::amount::Decimal;
use crate::tokenizer::split_fields;
use crate::{Result, SieError};

use chrono::NaiveDate;
use serde::Serialize;

use std::fmt;
use std::hash::{Hash, Hasher};

/// Dimension value (cost center, project...) a transaction can be tagged with.
///
/// Two annotations are equal when tag and text match, the description only
/// adds a human-readable name.
#[derive(Clone, Debug, Serialize)]
pub struct Annotation {
    pub tag: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Annotation {
    pub fn new(tag: u32, text: impl Into<String>) -> Self {
        Annotation {
            tag,
            text: text.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parses the content of a `#TRANS` object list: `tag text` pairs, where
    /// either part may be quoted.
    pub fn parse_list(list: &str) -> Result<Vec<Annotation>> {
        let parts = split_fields(list)?;
        if parts.len() % 2 != 0 {
            return Err(SieError::MalformedAnnotation(list.to_string()));
        }

        parts
            .chunks_exact(2)
            .map(|pair| {
                let tag = pair[0]
                    .parse::<u32>()
                    .map_err(|_| SieError::MalformedAnnotation(list.to_string()))?;
                Ok(Annotation::new(tag, pair[1].as_str()))
            })
            .collect()
    }
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.text == other.text
    }
}

impl Eq for Annotation {}

impl Hash for Annotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        self.text.hash(state);
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) if !description.is_empty() => {
                write!(f, "{} {}", self.text, description)
            }
            _ => f.write_str(&self.text),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    pub account: AccountId,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Transaction {
    pub fn is_annotated(&self) -> bool {
        !self.annotations.is_empty()
    }

    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }
}

/// Journal voucher (`#VER`) and the transactions booked under it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filed: Option<NaiveDate>,
    pub description: String,
    pub transactions: Vec<Transaction>,
}

impl Entry {
    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.transactions.iter().any(|t| t.has_annotation(annotation))
    }

    pub fn is_annotated(&self) -> bool {
        self.transactions.iter().any(Transaction::is_annotated)
    }

    /// Sum of every transaction. Entries are expected, but not required,
    /// to balance out to zero.
    pub fn net(&self) -> Result<Decimal> {
        Decimal::try_sum(self.transactions.iter().map(|t| t.amount))
    }
}
