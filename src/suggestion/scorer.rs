use std::collections::HashSet;

use serde::Serialize;

use crate::user::{self, model::Profile};

pub const SAME_UNIVERSITY: u32 = 3;
pub const SAME_SPORT: u32 = 3;
pub const PER_SHARED_SKILL: u32 = 2;
pub const REFERRAL_BONUS: u32 = 3;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    #[serde(flatten)]
    pub profile: Profile,
    pub score: u32,
}

/// Case-folded, trimmed form shared by every attribute comparison.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    match (a.as_deref().map(normalize), b.as_deref().map(normalize)) {
        (Some(a), Some(b)) if !a.is_empty() => a == b,
        _ => false,
    }
}

fn skill_set(p: &Profile) -> HashSet<String> {
    p.skills
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn shared_skills(me: &Profile, candidate: &Profile) -> usize {
    skill_set(me).intersection(&skill_set(candidate)).count()
}

pub fn score(me: &Profile, candidate: &Profile) -> u32 {
    let mut score = 0;
    if same(&me.university, &candidate.university) {
        score += SAME_UNIVERSITY;
    }
    if same(&me.sport, &candidate.sport) {
        score += SAME_SPORT;
    }
    score + PER_SHARED_SKILL * shared_skills(me, candidate) as u32
}

/// Scores every candidate except `me` and the already `connected`, then keeps
/// the `limit` best. Equal scores keep their incoming order.
pub fn rank(
    me: &Profile,
    candidates: Vec<Profile>,
    connected: &HashSet<user::Id>,
    referrers: &HashSet<user::Id>,
    limit: usize,
) -> Vec<Suggestion> {
    let mut ranked = candidates
        .into_iter()
        .filter(|c| c.id != me.id && !connected.contains(&c.id))
        .map(|c| {
            let bonus = if referrers.contains(&c.id) {
                REFERRAL_BONUS
            } else {
                0
            };
            Suggestion {
                score: score(me, &c) + bonus,
                profile: c,
            }
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}
