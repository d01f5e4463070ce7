//! Duplicate-membership detection for a single club.

use std::collections::{HashMap, HashSet};

use crate::clubs::Club;

/// Duplicates found within one club's membership list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub club_id: String,
    pub club_name: String,
    pub total_members: usize,
    pub unique_members: usize,
    pub duplicates: Vec<DuplicateEntry>,
}

/// One user id that appears more than once in a club.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub user_id: String,
    pub display_name: String,
    pub count: usize,
}

impl Finding {
    /// Memberships beyond the first for each duplicated user.
    pub fn extra_memberships(&self) -> usize {
        self.total_members - self.unique_members
    }
}

/// Inspect one club's membership list for repeated user ids.
///
/// Memberships without a resolved user reference are skipped: they are not
/// counted and never appear in the result. Returns `None` when every counted
/// id is distinct.
pub fn detect(club: &Club) -> Option<Finding> {
    let members: Vec<_> = club
        .members
        .iter()
        .filter_map(|member| member.user.as_ref())
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for user in &members {
        *counts.entry(user.id.as_str()).or_default() += 1;
    }

    let total = members.len();
    let unique = counts.len();
    if total == unique {
        return None;
    }

    // First occurrence in membership order keeps the report reproducible and
    // pins each display name to the first matching membership.
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for user in &members {
        let count = counts[user.id.as_str()];
        if count >= 2 && reported.insert(user.id.as_str()) {
            duplicates.push(DuplicateEntry {
                user_id: user.id.clone(),
                display_name: user.name.clone().unwrap_or_else(|| user.id.clone()),
                count,
            });
        }
    }

    Some(Finding {
        club_id: club.id.clone(),
        club_name: club.name.clone(),
        total_members: total,
        unique_members: unique,
        duplicates,
    })
}
