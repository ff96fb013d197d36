//! Three-pass identity resolver: exact, fuzzy, email-signal.
//! `resolve` is a pure function of (accounts, customers, decision_log) so
//! that replaying the same decision log over the same inputs always
//! reproduces the same spine.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{
    Account, Customer, Decision, DecisionLogEntry, IdentityLink, IdentitySpine, MatchId, MatchType,
    PendingReview,
};

use super::normalize::{normalize_name, similarity};

const FUZZY_AUTO_CONFIRM_THRESHOLD: f64 = 0.95;
const FUZZY_REVIEW_THRESHOLD: f64 = 0.75;
const EMAIL_SIGNAL_CONFIDENCE: f64 = 0.70;

#[derive(Debug, Clone)]
struct RawMatch {
    account_id: String,
    account_name: String,
    customer_id: String,
    customer_name: String,
    match_type: MatchType,
    confidence: f64,
    evidence: String,
}

/// Result of the three passes before any operator arbitration is applied.
struct RawResolution {
    /// Auto-confirmed on the first pass over the data: exact, fuzzy >=0.95,
    /// email-signal.
    auto: Vec<RawMatch>,
    /// Fuzzy candidates in [0.75, 0.95) requiring review, in descending
    /// confidence order with an assigned, stable match id.
    review: Vec<(MatchId, RawMatch)>,
    /// Accounts/customers left over after all three passes.
    unmatched_accounts: Vec<Account>,
    unmatched_customers: Vec<Customer>,
}

/// Pure three-pass sweep; does not consult the decision log.
fn three_pass_resolve(accounts: &[Account], customers: &[Customer]) -> RawResolution {
    let mut remaining_accounts: Vec<&Account> = accounts.iter().collect();
    remaining_accounts.sort_by(|a, b| a.account_id.cmp(&b.account_id));
    let mut remaining_customers: HashSet<&str> =
        customers.iter().map(|c| c.customer_id.as_str()).collect();
    let customers_by_id: HashMap<&str, &Customer> =
        customers.iter().map(|c| (c.customer_id.as_str(), c)).collect();

    let mut auto = Vec::new();
    let mut matched_accounts: HashSet<&str> = HashSet::new();

    // Pass 1: exact.
    let normalized_customers: HashMap<&str, String> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), normalize_name(&c.customer_name)))
        .collect();
    for account in &remaining_accounts {
        if matched_accounts.contains(account.account_id.as_str()) {
            continue;
        }
        let norm_account = normalize_name(&account.account_name);
        let hit = customers
            .iter()
            .filter(|c| remaining_customers.contains(c.customer_id.as_str()))
            .find(|c| normalized_customers[c.customer_id.as_str()] == norm_account);
        if let Some(customer) = hit {
            auto.push(RawMatch {
                account_id: account.account_id.clone(),
                account_name: account.account_name.clone(),
                customer_id: customer.customer_id.clone(),
                customer_name: customer.customer_name.clone(),
                match_type: MatchType::Exact,
                confidence: 1.0,
                evidence: "normalized name exact match".to_string(),
            });
            matched_accounts.insert(&account.account_id);
            remaining_customers.remove(customer.customer_id.as_str());
        }
    }

    // Pass 2: fuzzy, greedy assignment by descending score, ties broken by
    // ascending account_id.
    let mut candidates: Vec<(f64, &Account, &Customer)> = Vec::new();
    for account in &remaining_accounts {
        if matched_accounts.contains(account.account_id.as_str()) {
            continue;
        }
        for customer_id in remaining_customers.iter() {
            let customer = customers_by_id[customer_id];
            let score = similarity(&account.account_name, &customer.customer_name);
            if score >= FUZZY_REVIEW_THRESHOLD {
                candidates.push((score, account, customer));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap()
            .then_with(|| a.1.account_id.cmp(&b.1.account_id))
    });

    let mut review_raw: Vec<RawMatch> = Vec::new();
    for (score, account, customer) in candidates {
        if matched_accounts.contains(account.account_id.as_str())
            || !remaining_customers.contains(customer.customer_id.as_str())
        {
            continue;
        }
        matched_accounts.insert(&account.account_id);
        remaining_customers.remove(customer.customer_id.as_str());
        let raw = RawMatch {
            account_id: account.account_id.clone(),
            account_name: account.account_name.clone(),
            customer_id: customer.customer_id.clone(),
            customer_name: customer.customer_name.clone(),
            match_type: MatchType::FuzzyConfirmed,
            confidence: score,
            evidence: format!("token-set similarity {score:.3}"),
        };
        if score >= FUZZY_AUTO_CONFIRM_THRESHOLD {
            auto.push(raw);
        } else {
            review_raw.push(raw);
        }
    }
    // FIFO by descending confidence; ties broken by account_id (stable sort
    // on an already account_id-ascending-per-score input preserves this).
    review_raw.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap()
            .then_with(|| a.account_id.cmp(&b.account_id))
    });

    // Pass 3: email signal, unique one-to-one domain match.
    let mut accounts_by_domain: HashMap<&str, Vec<&Account>> = HashMap::new();
    for account in &remaining_accounts {
        if matched_accounts.contains(account.account_id.as_str()) {
            continue;
        }
        if let Some(domain) = account.email_domain.as_deref() {
            accounts_by_domain.entry(domain).or_default().push(account);
        }
    }
    let mut customers_by_domain: HashMap<&str, Vec<&Customer>> = HashMap::new();
    for customer_id in remaining_customers.iter() {
        let customer = customers_by_id[customer_id];
        if let Some(domain) = customer.email_domain.as_deref() {
            customers_by_domain.entry(domain).or_default().push(customer);
        }
    }
    let mut domains: Vec<&str> = accounts_by_domain.keys().copied().collect();
    domains.sort();
    for domain in domains {
        let accts = &accounts_by_domain[domain];
        let custs = match customers_by_domain.get(domain) {
            Some(v) => v,
            None => continue,
        };
        if accts.len() == 1 && custs.len() == 1 {
            let account = accts[0];
            let customer = custs[0];
            if matched_accounts.contains(account.account_id.as_str())
                || !remaining_customers.contains(customer.customer_id.as_str())
            {
                continue;
            }
            auto.push(RawMatch {
                account_id: account.account_id.clone(),
                account_name: account.account_name.clone(),
                customer_id: customer.customer_id.clone(),
                customer_name: customer.customer_name.clone(),
                match_type: MatchType::EmailSignal,
                confidence: EMAIL_SIGNAL_CONFIDENCE,
                evidence: format!("unique email domain match ({domain})"),
            });
            matched_accounts.insert(&account.account_id);
            remaining_customers.remove(customer.customer_id.as_str());
        }
    }

    let review: Vec<(MatchId, RawMatch)> = review_raw
        .into_iter()
        .enumerate()
        .map(|(i, raw)| (MatchId(format!("match_{i:05}")), raw))
        .collect();

    let unmatched_accounts: Vec<Account> = remaining_accounts
        .iter()
        .filter(|a| !matched_accounts.contains(a.account_id.as_str()))
        .filter(|a| !review.iter().any(|(_, r)| r.account_id == a.account_id))
        .map(|&a| a.clone())
        .collect();
    let unmatched_customers: Vec<Customer> = remaining_customers
        .iter()
        .filter(|id| !review.iter().any(|(_, r)| &r.customer_id == *id))
        .map(|id| customers_by_id[id].clone())
        .collect();

    RawResolution {
        auto,
        review,
        unmatched_accounts,
        unmatched_customers,
    }
}

fn raw_match_into_link(raw: RawMatch, seq: usize) -> IdentityLink {
    IdentityLink {
        rsx_id: crate::domain::entities::RsxId::from_sequence(seq),
        account_id: raw.account_id,
        customer_id: Some(raw.customer_id),
        match_type: raw.match_type,
        confidence: raw.confidence,
        evidence: raw.evidence,
    }
}

/// Applies the append-only decision log to a raw three-pass resolution,
/// producing the final spine. Pure and idempotent: replaying the same log
/// over the same raw resolution always yields the same spine.
pub(crate) fn resolve(
    accounts: &[Account],
    customers: &[Customer],
    decision_log: &[DecisionLogEntry],
) -> IdentitySpine {
    let raw = three_pass_resolve(accounts, customers);
    let accounts_by_id: HashMap<&str, &Account> =
        accounts.iter().map(|a| (a.account_id.as_str(), a)).collect();

    let mut review: HashMap<MatchId, RawMatch> = raw.review.into_iter().collect();
    let mut confirmed: Vec<RawMatch> = raw.auto;
    let mut rejected_account_ids: HashSet<String> = HashSet::new();
    let mut rejected_customer_ids: HashSet<String> = HashSet::new();

    for entry in decision_log {
        match entry.decision {
            Decision::Confirmed => {
                if let Some(raw_match) = review.remove(&entry.match_id) {
                    confirmed.push(raw_match);
                }
            }
            Decision::Rejected => {
                if let Some(raw_match) = review.remove(&entry.match_id) {
                    rejected_account_ids.insert(raw_match.account_id.clone());
                    rejected_customer_ids.insert(raw_match.customer_id.clone());
                }
            }
        }
    }

    let mut pending: Vec<(MatchId, RawMatch)> = review.into_iter().collect();
    pending.sort_by(|a, b| {
        b.1.confidence
            .partial_cmp(&a.1.confidence)
            .unwrap()
            .then_with(|| a.1.account_id.cmp(&b.1.account_id))
    });

    confirmed.sort_by(|a, b| a.account_id.cmp(&b.account_id));

    let mut seq = 0usize;
    let auto_matched: Vec<IdentityLink> = confirmed
        .into_iter()
        .map(|raw| {
            seq += 1;
            raw_match_into_link(raw, seq)
        })
        .collect();

    let needs_review: Vec<PendingReview> = pending
        .into_iter()
        .map(|(match_id, raw)| PendingReview {
            match_id,
            account_id: raw.account_id,
            account_name: raw.account_name,
            customer_id: raw.customer_id,
            customer_name: raw.customer_name,
            confidence: raw.confidence,
        })
        .collect();

    // A rejected fuzzy/email candidate leaves both sides unmatched (spec
    // §4.1), so a rejected account joins the accounts the three-pass sweep
    // never touched at all.
    let mut unmatched_account_ids: HashSet<String> = rejected_account_ids;
    let mut unmatched_accounts: Vec<Account> = raw.unmatched_accounts;
    for account in &unmatched_accounts {
        unmatched_account_ids.remove(&account.account_id);
    }
    unmatched_accounts.extend(
        unmatched_account_ids
            .into_iter()
            .filter_map(|id| accounts_by_id.get(id.as_str()).map(|a| (*a).clone())),
    );
    unmatched_accounts.sort_by(|a, b| a.account_id.cmp(&b.account_id));

    let unmatched: Vec<IdentityLink> = unmatched_accounts
        .into_iter()
        .map(|account| {
            seq += 1;
            IdentityLink {
                rsx_id: crate::domain::entities::RsxId::from_sequence(seq),
                account_id: account.account_id,
                customer_id: None,
                match_type: MatchType::Unmatched,
                confidence: 0.0,
                evidence: "no matching customer found".to_string(),
            }
        })
        .collect();

    // Mirror the account side: a customer the sweep never matched, or whose
    // candidate match was rejected, has no `IdentityLink` at all (it is not
    // the "account" side of any `rsx_id`) and must still be surfaced so
    // callers can account for its invoices/credit notes.
    let mut unmatched_customers: Vec<String> = raw
        .unmatched_customers
        .into_iter()
        .map(|c| c.customer_id)
        .collect();
    for id in rejected_customer_ids {
        if !unmatched_customers.contains(&id) {
            unmatched_customers.push(id);
        }
    }
    unmatched_customers.sort();

    IdentitySpine {
        auto_matched,
        needs_review,
        unmatched,
        unmatched_customers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, name: &str, domain: Option<&str>) -> Account {
        Account {
            account_id: id.to_string(),
            account_name: name.to_string(),
            email_domain: domain.map(str::to_string),
        }
    }

    fn customer(id: &str, name: &str, domain: Option<&str>) -> Customer {
        Customer {
            customer_id: id.to_string(),
            customer_name: name.to_string(),
            email_domain: domain.map(str::to_string),
        }
    }

    #[test]
    fn exact_pass_matches_after_normalization() {
        let accounts = vec![account("a1", "Acme, Inc.", None)];
        let customers = vec![customer("c1", "ACME", None)];
        let spine = resolve(&accounts, &customers, &[]);
        assert_eq!(spine.auto_matched.len(), 1);
        assert_eq!(spine.auto_matched[0].match_type, MatchType::Exact);
    }

    #[test]
    fn fuzzy_match_in_review_band_requires_decision() {
        let accounts = vec![account("a1", "Northwind Traders", None)];
        let customers = vec![customer("c1", "Northwind Trading Co", None)];
        let spine = resolve(&accounts, &customers, &[]);
        assert!(spine.auto_matched.is_empty());
        assert_eq!(spine.needs_review.len(), 1);
    }

    #[test]
    fn email_signal_matches_unique_domain() {
        let accounts = vec![account("a1", "Totally Different Name", Some("example.com"))];
        let customers = vec![customer("c1", "Unrelated Co", Some("example.com"))];
        let spine = resolve(&accounts, &customers, &[]);
        assert_eq!(spine.auto_matched.len(), 1);
        assert_eq!(spine.auto_matched[0].match_type, MatchType::EmailSignal);
    }

    #[test]
    fn unmatched_account_has_no_customer() {
        let accounts = vec![account("a1", "Lonely Corp", None)];
        let customers = vec![];
        let spine = resolve(&accounts, &customers, &[]);
        assert_eq!(spine.unmatched.len(), 1);
        assert!(!spine.unmatched[0].is_matched());
    }

    #[test]
    fn unmatched_customer_is_surfaced_with_no_counterpart_account() {
        let accounts = vec![];
        let customers = vec![customer("c1", "Solo Billing Co", None)];
        let spine = resolve(&accounts, &customers, &[]);
        assert!(spine.unmatched.is_empty());
        assert_eq!(spine.unmatched_customers, vec!["c1".to_string()]);
    }

    #[test]
    fn rejecting_a_fuzzy_candidate_leaves_both_sides_unmatched() {
        let accounts = vec![account("a1", "Northwind Traders", None)];
        let customers = vec![customer("c1", "Northwind Trading Co", None)];
        let spine_raw = resolve(&accounts, &customers, &[]);
        let match_id = spine_raw.needs_review[0].match_id.clone();
        let log = vec![DecisionLogEntry {
            match_id,
            decision: Decision::Rejected,
        }];
        let spine = resolve(&accounts, &customers, &log);
        assert!(spine.auto_matched.is_empty());
        assert!(spine.needs_review.is_empty());
        assert_eq!(spine.unmatched.len(), 1);
        assert_eq!(spine.unmatched[0].account_id, "a1");
        assert!(!spine.unmatched[0].is_matched());
        assert_eq!(spine.unmatched_customers, vec!["c1".to_string()]);
    }

    #[test]
    fn decision_log_replay_is_deterministic() {
        let accounts = vec![account("a1", "Northwind Traders", None)];
        let customers = vec![customer("c1", "Northwind Trading Co", None)];
        let spine_raw = resolve(&accounts, &customers, &[]);
        let match_id = spine_raw.needs_review[0].match_id.clone();
        let log = vec![DecisionLogEntry {
            match_id,
            decision: Decision::Confirmed,
        }];
        let spine_a = resolve(&accounts, &customers, &log);
        let spine_b = resolve(&accounts, &customers, &log);
        assert_eq!(spine_a, spine_b);
        assert_eq!(spine_a.auto_matched.len(), 1);
        assert!(spine_a.needs_review.is_empty());
    }
}
