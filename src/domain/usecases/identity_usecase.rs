//! `identity_get`/`identity_decide`/`identity_undo`/`identity_reset`. All
//! four are thin wrappers around the pure `identity_resolver::resolve`
//! replay function — the decision log is the only state that moves.

use fractic_server_error::ServerError;

use crate::domain::entities::{
    Account, Customer, Decision, DecisionLogEntry, IdentitySpine, MatchId, UndoOutcome,
};
use crate::domain::logic::identity_resolver;
use crate::errors::UnknownMatchId;

pub(crate) fn get(accounts: &[Account], customers: &[Customer], decision_log: &[DecisionLogEntry]) -> IdentitySpine {
    identity_resolver::resolve(accounts, customers, decision_log)
}

pub(crate) fn decide(
    accounts: &[Account],
    customers: &[Customer],
    decision_log: &mut Vec<DecisionLogEntry>,
    match_id: MatchId,
    decision: Decision,
) -> Result<IdentitySpine, ServerError> {
    let spine = identity_resolver::resolve(accounts, customers, decision_log);
    if !spine.needs_review.iter().any(|p| p.match_id == match_id) {
        return Err(UnknownMatchId::new(match_id.0.as_str()));
    }
    tracing::info!(match_id = match_id.0.as_str(), decision = ?decision, "identity decision recorded");
    decision_log.push(DecisionLogEntry { match_id, decision });
    Ok(identity_resolver::resolve(accounts, customers, decision_log))
}

/// Removes the most recent decision-log entry and replays. Does not panic on
/// an empty log — the `NoDecisions` variant is the "no decisions" signal the
/// caller surfaces instead of silently returning the unchanged spine.
pub(crate) fn undo(
    accounts: &[Account],
    customers: &[Customer],
    decision_log: &mut Vec<DecisionLogEntry>,
) -> UndoOutcome {
    let popped = decision_log.pop();
    tracing::info!(undone = ?popped, "identity decision undone");
    let spine = identity_resolver::resolve(accounts, customers, decision_log);
    match popped {
        Some(_) => UndoOutcome::Undone(spine),
        None => UndoOutcome::NoDecisions(spine),
    }
}

/// Clears the decision log entirely; callers also truncate session status
/// back to `identity_review`.
pub(crate) fn reset(decision_log: &mut Vec<DecisionLogEntry>) {
    tracing::info!(cleared = decision_log.len(), "identity decision log reset");
    decision_log.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, name: &str) -> Account {
        Account {
            account_id: id.to_string(),
            account_name: name.to_string(),
            email_domain: None,
        }
    }

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            customer_id: id.to_string(),
            customer_name: name.to_string(),
            email_domain: None,
        }
    }

    #[test]
    fn decide_then_undo_restores_the_prior_spine() {
        let accounts = vec![account("a1", "Northwind Traders")];
        let customers = vec![customer("c1", "Northwind Trading Co")];
        let mut log = Vec::new();

        let before = get(&accounts, &customers, &log);
        let match_id = before.needs_review[0].match_id.clone();

        decide(&accounts, &customers, &mut log, match_id, Decision::Confirmed).unwrap();
        assert_eq!(log.len(), 1);

        let after_undo = undo(&accounts, &customers, &mut log);
        assert!(log.is_empty());
        assert!(after_undo.undone());
        assert_eq!(after_undo.into_spine(), before);
    }

    #[test]
    fn undo_on_empty_log_signals_no_decisions_without_panicking() {
        let accounts = vec![account("a1", "Northwind Traders")];
        let customers = vec![customer("c1", "Northwind Trading Co")];
        let mut log = Vec::new();

        let before = get(&accounts, &customers, &log);
        let result = undo(&accounts, &customers, &mut log);
        assert!(!result.undone());
        assert_eq!(result.into_spine(), before);
    }

    #[test]
    fn deciding_an_unknown_match_id_errors() {
        let accounts = vec![account("a1", "Acme")];
        let customers = vec![customer("c1", "Acme")];
        let mut log = Vec::new();
        let bogus = MatchId("match_99999".to_string());
        assert!(decide(&accounts, &customers, &mut log, bogus, Decision::Confirmed).is_err());
    }
}
