//! Best-effort joins for stores without native join support.
//!
//! A primary collection is already in hand; its foreign keys are projected,
//! the secondary collection is fetched with one batch call, and matching
//! secondary rows are merged in. Rows without a match pass through untouched,
//! and a failing secondary fetch degrades to the unmodified primary rows.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::future::Future;

use metrics::counter;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The primary collection was empty; nothing was fetched.
    NoPrimary,
    /// No primary row carried a foreign key; nothing was fetched.
    NoKeys,
    /// The batch fetch returned no rows.
    SecondaryEmpty,
    /// The batch fetch failed; primary rows are returned unmodified.
    SecondaryFailed { message: String },
    Merged { matched: usize },
}

impl JoinOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, JoinOutcome::SecondaryFailed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Joined<P> {
    pub rows: Vec<P>,
    pub outcome: JoinOutcome,
}

/// Describes how a primary row `P` refers to a secondary row `S` by key `K`.
pub struct KeyJoin<P, S, K> {
    relation: &'static str,
    foreign_key: fn(&P) -> Option<K>,
    primary_key: fn(&S) -> K,
    merge: fn(P, &S) -> P,
}

impl<P, S, K> KeyJoin<P, S, K>
where
    K: Ord + Clone,
{
    pub const fn new(
        relation: &'static str,
        foreign_key: fn(&P) -> Option<K>,
        primary_key: fn(&S) -> K,
        merge: fn(P, &S) -> P,
    ) -> Self {
        Self {
            relation,
            foreign_key,
            primary_key,
            merge,
        }
    }

    /// Distinct foreign keys referenced by `rows`, with absent keys dropped.
    pub fn referenced_keys(&self, rows: &[P]) -> Vec<K> {
        rows.iter()
            .filter_map(self.foreign_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Run the join. `fetch` is called at most once, with the distinct keys.
    pub async fn run<F, Fut, E>(&self, rows: Vec<P>, fetch: F) -> Joined<P>
    where
        F: FnOnce(Vec<K>) -> Fut,
        Fut: Future<Output = Result<Vec<S>, E>>,
        E: Display,
    {
        if rows.is_empty() {
            return Joined {
                rows,
                outcome: JoinOutcome::NoPrimary,
            };
        }

        let keys = self.referenced_keys(&rows);
        if keys.is_empty() {
            debug!(relation = self.relation, "no foreign keys to join");
            return Joined {
                rows,
                outcome: JoinOutcome::NoKeys,
            };
        }

        let secondary = match fetch(keys).await {
            Ok(secondary) => secondary,
            Err(err) => {
                warn!(
                    relation = self.relation,
                    error = %err,
                    "secondary fetch failed; returning rows without enrichment"
                );
                counter!(
                    "teamboard_enrichment_degraded_total",
                    "relation" => self.relation,
                    "reason" => "secondary_failed"
                )
                .increment(1);
                return Joined {
                    rows,
                    outcome: JoinOutcome::SecondaryFailed {
                        message: err.to_string(),
                    },
                };
            }
        };

        if secondary.is_empty() {
            counter!(
                "teamboard_enrichment_degraded_total",
                "relation" => self.relation,
                "reason" => "secondary_empty"
            )
            .increment(1);
            return Joined {
                rows,
                outcome: JoinOutcome::SecondaryEmpty,
            };
        }

        let lookup: BTreeMap<K, &S> = secondary
            .iter()
            .map(|row| ((self.primary_key)(row), row))
            .collect();

        let mut matched = 0;
        let rows = rows
            .into_iter()
            .map(|row| {
                let found = (self.foreign_key)(&row).and_then(|key| lookup.get(&key).copied());
                match found {
                    Some(secondary) => {
                        matched += 1;
                        (self.merge)(row, secondary)
                    }
                    None => row,
                }
            })
            .collect();

        Joined {
            rows,
            outcome: JoinOutcome::Merged { matched },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        id: u32,
        customer: Option<u32>,
        customer_name: Option<String>,
    }

    struct Customer {
        id: u32,
        name: &'static str,
    }

    const ORDER_CUSTOMER: KeyJoin<Order, Customer, u32> = KeyJoin::new(
        "order.customer",
        |order| order.customer,
        |customer| customer.id,
        |order, customer| Order {
            customer_name: Some(customer.name.to_string()),
            ..order
        },
    );

    fn order(id: u32, customer: Option<u32>) -> Order {
        Order {
            id,
            customer,
            customer_name: None,
        }
    }

    #[tokio::test]
    async fn empty_primary_skips_fetch() {
        let calls = AtomicUsize::new(0);
        let joined = ORDER_CUSTOMER
            .run(Vec::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, String>(Vec::new()) }
            })
            .await;

        assert!(joined.rows.is_empty());
        assert_eq!(joined.outcome, JoinOutcome::NoPrimary);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rows_without_keys_pass_through() {
        let rows = vec![order(1, None), order(2, None)];
        let joined = ORDER_CUSTOMER
            .run(rows.clone(), |_| async {
                Err::<Vec<Customer>, _>("must not be called")
            })
            .await;

        assert_eq!(joined.rows, rows);
        assert_eq!(joined.outcome, JoinOutcome::NoKeys);
    }

    #[tokio::test]
    async fn fetch_receives_distinct_keys_once() {
        let rows = vec![order(1, Some(7)), order(2, Some(7)), order(3, Some(9))];
        let joined = ORDER_CUSTOMER
            .run(rows, |keys| async move {
                assert_eq!(keys, vec![7, 9]);
                Ok::<_, String>(vec![Customer { id: 7, name: "Ada" }])
            })
            .await;

        let names: Vec<_> = joined
            .rows
            .iter()
            .map(|row| (row.id, row.customer_name.as_deref()))
            .collect();
        assert_eq!(names, vec![(1, Some("Ada")), (2, Some("Ada")), (3, None)]);
        assert_eq!(joined.outcome, JoinOutcome::Merged { matched: 2 });
    }

    #[tokio::test]
    async fn failed_fetch_returns_primary_unmodified() {
        let rows = vec![order(1, Some(1)), order(2, Some(2))];
        let joined = ORDER_CUSTOMER
            .run(rows.clone(), |_| async {
                Err::<Vec<Customer>, _>("connection reset")
            })
            .await;

        assert_eq!(joined.rows, rows);
        assert!(joined.outcome.is_degraded());
    }

    #[tokio::test]
    async fn empty_secondary_returns_primary_unmodified() {
        let rows = vec![order(1, Some(1))];
        let joined = ORDER_CUSTOMER
            .run(rows.clone(), |_| async { Ok::<Vec<Customer>, String>(Vec::new()) })
            .await;

        assert_eq!(joined.rows, rows);
        assert_eq!(joined.outcome, JoinOutcome::SecondaryEmpty);
    }
}
