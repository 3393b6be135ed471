//! Stock projection: a pure fold over the movement ledger.
//!
//! The ledger is the source of truth; the projection is disposable and can be
//! rebuilt from scratch at any time by replaying movements. Summation is
//! commutative, so replay order never changes the result.

use rust_decimal::Decimal;

use orderdesk_core::{DomainError, DomainResult};

use crate::movement::StockMovement;

/// Fold a product's movements into its current stock: `Σ sign(kind) * quantity`.
///
/// Fails instead of panicking when the sum leaves the `Decimal` range.
pub fn fold_stock<'a>(movements: impl IntoIterator<Item = &'a StockMovement>) -> DomainResult<Decimal> {
    movements.into_iter().try_fold(Decimal::ZERO, |acc, m| {
        acc.checked_add(m.signed_quantity())
            .ok_or_else(|| DomainError::invalid_argument(format!("stock of product {} overflows", m.product_id)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_core::{Actor, MovementId, ProductId};
    use proptest::prelude::*;

    use crate::movement::{MovementKind, NewMovement};

    fn movement(product_id: ProductId, kind: MovementKind, quantity: Decimal) -> StockMovement {
        let new = NewMovement::new(product_id, kind, quantity, "test", Actor::system()).unwrap();
        StockMovement::record(MovementId::new(), new, Utc::now())
    }

    #[test]
    fn entry_exit_adjustment_scenario_folds_to_eight() {
        let p = ProductId::new();
        let ledger = vec![
            movement(p, MovementKind::Entry, Decimal::new(10, 0)),
            movement(p, MovementKind::Exit, Decimal::new(3, 0)),
            movement(p, MovementKind::Adjustment, Decimal::new(1, 0)),
        ];
        assert_eq!(fold_stock(&ledger).unwrap(), Decimal::new(8, 0));
    }

    #[test]
    fn empty_ledger_folds_to_zero() {
        assert_eq!(fold_stock(&Vec::<StockMovement>::new()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn stock_may_go_negative() {
        let p = ProductId::new();
        let ledger = vec![movement(p, MovementKind::Exit, Decimal::new(5, 0))];
        assert_eq!(fold_stock(&ledger).unwrap(), Decimal::new(-5, 0));
    }

    #[test]
    fn overflowing_sum_is_an_error() {
        let p = ProductId::new();
        let huge = StockMovement {
            quantity: Decimal::MAX,
            ..movement(p, MovementKind::Entry, Decimal::ONE)
        };
        let ledger = vec![huge.clone(), StockMovement { id: MovementId::new(), ..huge }];

        let err = fold_stock(&ledger).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    fn kind_strategy() -> impl Strategy<Value = MovementKind> {
        prop_oneof![
            Just(MovementKind::Entry),
            Just(MovementKind::Exit),
            Just(MovementKind::Adjustment),
        ]
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..1_000_000i64, any::<bool>(), 0u32..4u32)
            .prop_map(|(n, neg, scale)| Decimal::new(if neg { -n } else { n }, scale))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: replaying any permutation of a ledger yields the same stock.
        #[test]
        fn fold_is_order_independent(
            (ledger, shuffled) in prop::collection::vec((kind_strategy(), quantity_strategy()), 0..24)
                .prop_map(|rows| {
                    let p = ProductId::new();
                    rows.into_iter().map(|(k, q)| movement(p, k, q)).collect::<Vec<_>>()
                })
                .prop_flat_map(|ledger| (Just(ledger.clone()), Just(ledger).prop_shuffle()))
        ) {
            prop_assert_eq!(fold_stock(&ledger).unwrap(), fold_stock(&shuffled).unwrap());
        }
    }
}
