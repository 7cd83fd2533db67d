use serde::{Deserialize, Serialize};
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::str::FromStr;

use super::CollectionObject;
use crate::error::ServiceError;

/// The answer a user gave to a party invitation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReplyState {
    Agreed,
    InThought,
    Refused,
}

impl ReplyState {
    pub const ALL: [ReplyState; 3] = [ReplyState::Agreed, ReplyState::InThought, ReplyState::Refused];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyState::Agreed => "agreed",
            ReplyState::InThought => "in_thought",
            ReplyState::Refused => "refused",
        }
    }
}

impl fmt::Display for ReplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyState {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReplyState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ServiceError::ValidationError(format!("Unknown reply state: {}", s)))
    }
}

/// Outcome of [`PartyReplier::record_reply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyChange {
    Unchanged,
    Added,
    Moved { from: ReplyState },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplyTally {
    pub agreed: usize,
    #[serde(rename = "inThought")]
    pub in_thought: usize,
    pub refused: usize,
    pub total: usize,
}

/// Replies collected for a single party.
///
/// Each list holds user ids in the order their replies arrived. Decoding
/// never rejects a user listed under several states; use
/// [`PartyReplier::conflicting_users`] to detect that, and
/// [`PartyReplier::record_reply`] to write replies without producing it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PartyReplier {
    #[serde(flatten)]
    pub base: CollectionObject,
    #[serde(alias = "_id_owner", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "usersAgreed", alias = "_id_users_agreed")]
    pub users_agreed: Vec<String>,
    #[serde(rename = "usersInThought", alias = "_id_users_in_thought")]
    pub users_in_thought: Vec<String>,
    #[serde(rename = "usersRefused", alias = "_id_users_refused")]
    pub users_refused: Vec<String>,
}

impl PartyReplier {
    pub fn new(owner: Option<String>) -> Self {
        Self {
            base: CollectionObject::new(),
            owner,
            users_agreed: Vec::new(),
            users_in_thought: Vec::new(),
            users_refused: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn users(&self, state: ReplyState) -> &[String] {
        match state {
            ReplyState::Agreed => &self.users_agreed,
            ReplyState::InThought => &self.users_in_thought,
            ReplyState::Refused => &self.users_refused,
        }
    }

    fn users_mut(&mut self, state: ReplyState) -> &mut Vec<String> {
        match state {
            ReplyState::Agreed => &mut self.users_agreed,
            ReplyState::InThought => &mut self.users_in_thought,
            ReplyState::Refused => &mut self.users_refused,
        }
    }

    /// Returns the first state (agreed, in thought, refused) listing `user`.
    pub fn reply_of(&self, user: &str) -> Option<ReplyState> {
        ReplyState::ALL
            .into_iter()
            .find(|state| self.users(*state).iter().any(|u| u == user))
    }

    pub fn has_participant(&self, user: &str) -> bool {
        self.reply_of(user).is_some()
    }

    pub fn is_owned_by(&self, user: &str) -> bool {
        self.owner.as_deref() == Some(user)
    }

    /// Puts `user` under `state` and removes them from every other list.
    pub fn record_reply(&mut self, user: &str, state: ReplyState) -> ReplyChange {
        let from = ReplyState::ALL
            .into_iter()
            .filter(|other| *other != state)
            .find(|other| self.users(*other).iter().any(|u| u == user));
        let already_listed = self.users(state).iter().any(|u| u == user);

        if from.is_none() && already_listed {
            return ReplyChange::Unchanged;
        }

        for other in ReplyState::ALL.into_iter().filter(|other| *other != state) {
            self.users_mut(other).retain(|u| u != user);
        }
        if !already_listed {
            self.users_mut(state).push(user.to_string());
        }
        self.base.touch();

        match from {
            Some(from) => ReplyChange::Moved { from },
            None => ReplyChange::Added,
        }
    }

    /// Removes `user` from all lists, returning the state they were found in.
    pub fn withdraw_reply(&mut self, user: &str) -> Option<ReplyState> {
        let previous = self.reply_of(user)?;
        for state in ReplyState::ALL {
            self.users_mut(state).retain(|u| u != user);
        }
        self.base.touch();
        Some(previous)
    }

    pub fn tally(&self) -> ReplyTally {
        let agreed = self.users_agreed.len();
        let in_thought = self.users_in_thought.len();
        let refused = self.users_refused.len();
        ReplyTally {
            agreed,
            in_thought,
            refused,
            total: agreed + in_thought + refused,
        }
    }

    /// Users listed under more than one state, in first-seen order.
    pub fn conflicting_users(&self) -> Vec<String> {
        let mut seen: HashMap<&str, Option<ReplyState>> = HashMap::new();
        let mut order = Vec::new();
        let mut conflicts = Vec::new();

        for state in ReplyState::ALL {
            for user in self.users(state) {
                match seen.entry(user.as_str()) {
                    Entry::Vacant(slot) => {
                        slot.insert(Some(state));
                        order.push(user.as_str());
                    }
                    // `None` marks a user already seen under a different state
                    Entry::Occupied(mut slot) => {
                        if slot.get().is_some_and(|first| first != state) {
                            *slot.get_mut() = None;
                        }
                    }
                }
            }
        }

        for user in order {
            if seen.get(user).is_some_and(|state| state.is_none()) {
                conflicts.push(user.to_string());
            }
        }
        conflicts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> CollectionObject {
        CollectionObject {
            id: "replier-1".into(),
            created_at: "2024-05-01T10:00:00+00:00".into(),
            updated_at: "2024-05-01T10:00:00+00:00".into(),
        }
    }

    fn sample() -> PartyReplier {
        PartyReplier {
            base: base(),
            owner: Some("u1".into()),
            users_agreed: vec!["u2".into(), "u3".into()],
            users_in_thought: vec![],
            users_refused: vec!["u4".into()],
        }
    }

    #[test]
    fn json_round_trip_keeps_every_field() {
        let replier = sample();
        let encoded = serde_json::to_string(&replier).unwrap();
        let decoded: PartyReplier = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, replier);
    }

    #[test]
    fn wire_format_uses_camel_case_and_flattens_base() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "replier-1",
                "createdAt": "2024-05-01T10:00:00+00:00",
                "updatedAt": "2024-05-01T10:00:00+00:00",
                "owner": "u1",
                "usersAgreed": ["u2", "u3"],
                "usersInThought": [],
                "usersRefused": ["u4"]
            })
        );
    }

    #[test]
    fn missing_owner_is_distinct_from_empty_owner() {
        let absent: PartyReplier = serde_json::from_value(json!({
            "id": "r", "createdAt": "t", "updatedAt": "t",
            "usersAgreed": [], "usersInThought": [], "usersRefused": []
        }))
        .unwrap();
        let empty: PartyReplier = serde_json::from_value(json!({
            "id": "r", "createdAt": "t", "updatedAt": "t", "owner": "",
            "usersAgreed": [], "usersInThought": [], "usersRefused": []
        }))
        .unwrap();

        assert_eq!(absent.owner, None);
        assert_eq!(empty.owner, Some(String::new()));

        let reencoded = serde_json::to_value(&absent).unwrap();
        assert!(reencoded.get("owner").is_none());
    }

    #[test]
    fn lists_are_required_on_decode() {
        let result = serde_json::from_value::<PartyReplier>(json!({
            "id": "r", "createdAt": "t", "updatedAt": "t",
            "usersAgreed": [], "usersRefused": []
        }));
        assert!(result.is_err());
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let replier: PartyReplier = serde_json::from_value(json!({
            "id": "r", "createdAt": "t", "updatedAt": "t",
            "_id_owner": "host",
            "_id_users_agreed": ["a"],
            "_id_users_in_thought": ["b"],
            "_id_users_refused": []
        }))
        .unwrap();
        assert_eq!(replier.owner.as_deref(), Some("host"));
        assert_eq!(replier.users_agreed, vec!["a"]);
        assert_eq!(replier.users_in_thought, vec!["b"]);
        assert!(replier.users_refused.is_empty());
    }

    #[test]
    fn record_reply_moves_user_between_lists() {
        let mut replier = sample();

        assert_eq!(replier.record_reply("u5", ReplyState::InThought), ReplyChange::Added);
        assert_eq!(
            replier.record_reply("u2", ReplyState::Refused),
            ReplyChange::Moved { from: ReplyState::Agreed }
        );
        assert_eq!(replier.record_reply("u2", ReplyState::Refused), ReplyChange::Unchanged);

        assert_eq!(replier.users_agreed, vec!["u3"]);
        assert_eq!(replier.users_in_thought, vec!["u5"]);
        assert_eq!(replier.users_refused, vec!["u4", "u2"]);
        assert_eq!(replier.reply_of("u2"), Some(ReplyState::Refused));
    }

    #[test]
    fn record_reply_cleans_up_duplicate_listing() {
        let mut replier = sample();
        replier.users_in_thought.push("u4".into());

        assert_eq!(
            replier.record_reply("u4", ReplyState::Refused),
            ReplyChange::Moved { from: ReplyState::InThought }
        );
        assert!(replier.users_in_thought.is_empty());
        assert_eq!(replier.users_refused, vec!["u4"]);
        assert!(replier.conflicting_users().is_empty());
    }

    #[test]
    fn withdraw_reply_removes_user_everywhere() {
        let mut replier = sample();
        replier.users_refused.push("u3".into());

        assert_eq!(replier.withdraw_reply("u3"), Some(ReplyState::Agreed));
        assert!(!replier.has_participant("u3"));
        assert_eq!(replier.withdraw_reply("nobody"), None);
    }

    #[test]
    fn tally_counts_each_list() {
        let tally = sample().tally();
        assert_eq!(
            tally,
            ReplyTally { agreed: 2, in_thought: 0, refused: 1, total: 3 }
        );
    }

    #[test]
    fn conflicting_users_reports_cross_list_entries_only() {
        let mut replier = sample();
        replier.users_agreed.push("u2".into());
        replier.users_in_thought.push("u4".into());
        replier.users_refused.push("u3".into());

        assert_eq!(replier.conflicting_users(), vec!["u3", "u4"]);
    }

    #[test]
    fn ownership_requires_exact_owner() {
        let replier = sample();
        assert!(replier.is_owned_by("u1"));
        assert!(!replier.is_owned_by("u2"));
        assert!(!PartyReplier::new(None).is_owned_by(""));
    }

    #[test]
    fn reply_state_parses_wire_names() {
        assert_eq!("in_thought".parse::<ReplyState>().unwrap(), ReplyState::InThought);
        assert!("maybe".parse::<ReplyState>().is_err());
        assert_eq!(serde_json::to_value(ReplyState::Refused).unwrap(), json!("refused"));
    }
}
