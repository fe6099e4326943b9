//! Sibling ordering for display.

use std::cmp::Ordering;

use super::node::GroupType;

/// Compare two siblings for display order.
///
/// Special groups (anything but `default`) come first. Within a tier names
/// compare case-insensitively; exact name and then id break the remaining
/// ties so the order is total.
pub fn sibling_order(
    a: (&GroupType, &str, &str),
    b: (&GroupType, &str, &str),
) -> Ordering {
    let (a_type, a_name, a_id) = a;
    let (b_type, b_name, b_id) = b;

    b_type
        .is_special()
        .cmp(&a_type.is_special())
        .then_with(|| caseless_cmp(a_name, b_name))
        .then_with(|| a_name.cmp(b_name))
        .then_with(|| a_id.cmp(b_id))
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
