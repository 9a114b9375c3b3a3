/*!
 User-declared row filters applied to message exports.

 Filters persist as a JSON list in the user's settings. Each filter names a
 column, a comparison operator, and a value; active filters for the current
 message family are combined with AND into a single selection clause handed
 to the store's query layer.

 A column name may carry an `sms.` or `mms.` prefix to pin the filter to one
 family: a filter applies to SMS unless its column starts with `mms.`, and to
 MMS unless it starts with `sms.`. The prefix is stripped from the emitted
 clause.
*/

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Comparison operators a filter may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IN")]
    In,
}

impl Display for FilterOperator {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            FilterOperator::Equal => "==",
            FilterOperator::Less => "<",
            FilterOperator::LessOrEqual => "<=",
            FilterOperator::Greater => ">",
            FilterOperator::GreaterOrEqual => ">=",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Like => "LIKE",
            FilterOperator::Between => "BETWEEN",
            FilterOperator::In => "IN",
        };
        write!(fmt, "{text}")
    }
}

/// One user-declared row selection predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
    pub active: bool,
}

impl Display for MessageFilter {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            fmt,
            "{} {} \"{}\" [{}]",
            self.column,
            self.operator,
            self.value,
            if self.active { "Active" } else { "Inactive" }
        )
    }
}

/// The message family a selection clause is being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFamily {
    Sms,
    Mms,
}

/// Parse a JSON filter list
pub fn parse_filters(json: &str) -> Result<Vec<MessageFilter>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Combine the active filters for `family` into one selection clause.
///
/// SMS stores dates in epoch milliseconds and MMS in epoch seconds, so
/// `date`/`date_sent` values are unit-normalized: an SMS filter value of 11 or
/// fewer digits gains a `000` suffix, an MMS value of more than 11 digits
/// loses its last three.
pub fn message_selection(filters: &[MessageFilter], family: MessageFamily) -> Option<String> {
    let clauses: Vec<String> = filters
        .iter()
        .filter(|filter| {
            filter.active
                && match family {
                    MessageFamily::Sms => !filter.column.starts_with("mms."),
                    MessageFamily::Mms => !filter.column.starts_with("sms."),
                }
        })
        .map(|filter| {
            let column = filter
                .column
                .split_once('.')
                .map(|(_, rest)| rest)
                .unwrap_or(&filter.column);
            let mut value = filter.value.clone();
            if column == "date" || column == "date_sent" {
                match family {
                    MessageFamily::Sms if value.len() <= 11 => value.push_str("000"),
                    MessageFamily::Mms if value.len() > 11 => {
                        value.truncate(value.len() - 3);
                    }
                    _ => {}
                }
            }
            format!("{column} {} {value}", filter.operator)
        })
        .collect();
    if clauses.is_empty() {
        return None;
    }
    Some(clauses.join(" AND "))
}
