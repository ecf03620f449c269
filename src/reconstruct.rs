//! Sentinel-delimited group encoding
//!
//! Senders flatten a list of groups by writing the sentinel before each group.
//! [`reconstruct`] accepts any token stream though: leading tokens, doubled
//! sentinels and trailing groups are all fine, and empty groups are dropped.

use crate::token::Token;

/// One sentinel-delimited run of tokens, never empty
pub type Group = Vec<Token>;

/// Groups in the order they were encountered
pub type SequenceSet = Vec<Group>;

/// Split a flat token stream into groups at every sentinel
pub fn reconstruct(flat: &[Token]) -> SequenceSet {
    let mut groups = Vec::new();
    let mut current: Group = Vec::new();

    for token in flat {
        if token.is_sentinel() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token.clone());
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Encode groups the way senders do: a sentinel before each group
pub fn flatten<G: AsRef<[Token]>>(groups: &[G]) -> Vec<Token> {
    let mut flat = Vec::with_capacity(groups.iter().map(|g| g.as_ref().len() + 1).sum());
    for group in groups {
        flat.push(Token::Start);
        flat.extend(group.as_ref().iter().cloned());
    }
    flat
}
