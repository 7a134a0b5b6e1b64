use crate::account::AccountId;
use crate::amount::Decimal;
use crate::transaction::Annotation;
use crate::{Result, SieError};

use chrono::NaiveDate;

/// One input line, decoded by its leading keyword.
#[derive(Debug, PartialEq)]
pub enum Directive<'s> {
    Flag(u32),
    Program {
        name: &'s str,
        version: &'s str,
    },
    Format(&'s str),
    Generated {
        date: Option<NaiveDate>,
        author: Option<&'s str>,
    },
    SieType(&'s str),
    OrgNo(&'s str),
    CompanyName(&'s str),
    AccountPlan(&'s str),
    /// Current fiscal year (`#RAR 0`).
    FiscalYear {
        starts: NaiveDate,
        ends: NaiveDate,
    },
    Dimension {
        tag: u32,
        name: &'s str,
    },
    Account {
        id: AccountId,
        description: &'s str,
    },
    AccountType {
        id: AccountId,
        kind: &'s str,
    },
    /// Opening balance of the current fiscal year (`#IB 0`).
    OpeningBalance {
        id: AccountId,
        amount: Decimal,
    },
    /// Closing balance of the current fiscal year (`#UB 0`).
    ClosingBalance {
        id: AccountId,
        amount: Decimal,
    },
    EntryBegin {
        kind: &'s str,
        id: &'s str,
        date: NaiveDate,
        description: &'s str,
        filed: Option<NaiveDate>,
    },
    Transaction {
        account: AccountId,
        amount: Decimal,
        annotations: Vec<Annotation>,
    },
    Annotation(Annotation),
    BlockOpen,
    EntryEnd,
    /// Known directive for another fiscal year, or an unknown keyword.
    Ignored(&'s str),
}

macro_rules! field {
    ($fields:ident, $idx:expr, $directive:expr) => {
        $fields
            .get($idx)
            .map(String::as_str)
            .ok_or(SieError::MissingField {
                directive: $directive,
                position: $idx,
            })?
    };
}

fn optional(fields: &[String], idx: usize) -> Option<&str> {
    fields.get(idx).map(String::as_str).filter(|s| !s.is_empty())
}

/// Parses a `YYYYMMDD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SieError::MalformedDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| SieError::MalformedDate(s.to_string()))
}

fn parse_number(directive: &'static str, s: &str) -> Result<u32> {
    s.parse().map_err(|_| SieError::MalformedField {
        directive,
        value: s.to_string(),
    })
}

impl<'s> TryFrom<&'s [String]> for Directive<'s> {
    type Error = SieError;

    fn try_from(fields: &'s [String]) -> Result<Self> {
        Self::decode(fields)
    }
}

impl<'s> Directive<'s> {
    pub fn decode(fields: &'s [String]) -> Result<Self> {
        let Some(keyword) = fields.first().map(String::as_str) else {
            return Ok(Directive::Ignored(""));
        };

        let directive = match keyword {
            "#FLAGGA" => Self::Flag(parse_number("#FLAGGA", field!(fields, 1, "#FLAGGA"))?),
            "#PROGRAM" => Self::Program {
                name: field!(fields, 1, "#PROGRAM"),
                version: optional(fields, 2).unwrap_or_default(),
            },
            "#FORMAT" => Self::Format(field!(fields, 1, "#FORMAT")),
            "#GEN" => Self::Generated {
                date: optional(fields, 1).map(parse_date).transpose()?,
                author: optional(fields, 2),
            },
            "#SIETYP" => Self::SieType(field!(fields, 1, "#SIETYP")),
            "#ORGNR" => Self::OrgNo(field!(fields, 1, "#ORGNR")),
            "#FNAMN" => Self::CompanyName(field!(fields, 1, "#FNAMN")),
            "#KPTYP" => Self::AccountPlan(field!(fields, 1, "#KPTYP")),
            "#RAR" => {
                if field!(fields, 1, "#RAR") != "0" {
                    return Ok(Self::Ignored(keyword));
                }
                Self::FiscalYear {
                    starts: parse_date(field!(fields, 2, "#RAR"))?,
                    ends: parse_date(field!(fields, 3, "#RAR"))?,
                }
            }
            "#DIM" => Self::Dimension {
                tag: parse_number("#DIM", field!(fields, 1, "#DIM"))?,
                name: field!(fields, 2, "#DIM"),
            },
            "#KONTO" => Self::Account {
                id: AccountId::new(field!(fields, 1, "#KONTO")),
                description: optional(fields, 2).unwrap_or_default(),
            },
            "#KTYP" => Self::AccountType {
                id: AccountId::new(field!(fields, 1, "#KTYP")),
                kind: field!(fields, 2, "#KTYP"),
            },
            "#IB" | "#UB" => {
                let name = if keyword == "#IB" { "#IB" } else { "#UB" };
                if field!(fields, 1, name) != "0" {
                    return Ok(Self::Ignored(keyword));
                }
                let id = AccountId::new(field!(fields, 2, name));
                let amount = Decimal::parse(field!(fields, 3, name))?;
                if name == "#IB" {
                    Self::OpeningBalance { id, amount }
                } else {
                    Self::ClosingBalance { id, amount }
                }
            }
            "#VER" => Self::EntryBegin {
                kind: field!(fields, 1, "#VER"),
                id: field!(fields, 2, "#VER"),
                date: parse_date(field!(fields, 3, "#VER"))?,
                description: optional(fields, 4).unwrap_or_default(),
                filed: optional(fields, 5).map(parse_date).transpose()?,
            },
            "#TRANS" => {
                let account = AccountId::new(field!(fields, 1, "#TRANS"));
                // the object list may be left out altogether
                let (annotations, amount) = if fields.len() == 3 {
                    (Vec::new(), field!(fields, 2, "#TRANS"))
                } else {
                    (
                        Annotation::parse_list(field!(fields, 2, "#TRANS"))?,
                        field!(fields, 3, "#TRANS"),
                    )
                };
                Self::Transaction {
                    account,
                    amount: Decimal::parse(amount)?,
                    annotations,
                }
            }
            "#OBJEKT" => {
                let tag = field!(fields, 1, "#OBJEKT");
                let tag = tag
                    .parse()
                    .map_err(|_| SieError::MalformedAnnotation(tag.to_string()))?;
                let mut annotation = Annotation::new(tag, field!(fields, 2, "#OBJEKT"));
                if let Some(description) = optional(fields, 3) {
                    annotation = annotation.with_description(description);
                }
                Self::Annotation(annotation)
            }
            "{" => Self::BlockOpen,
            "}" => Self::EntryEnd,
            _ => Self::Ignored(keyword),
        };

        Ok(directive)
    }
}
