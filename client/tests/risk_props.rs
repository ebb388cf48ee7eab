//! Property tests for the risk projection

use proptest::prelude::*;
use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;
use tenor_client::risk::{self, PoolConfig, Position, PositionKind};
use tenor_client::Action;

proptest! {
    /// Borrow projection is pure and monotone: inputs untouched, risk
    /// never decreases with the extra claim
    #[test]
    fn borrow_projection_pure_and_monotone(
        deposit in 1_000u64..=1_000_000_000,
        borrow in 1u64..=1_000_000,
        weight_bps in 1_000u64..=10_000,
    ) {
        let token = Pubkey::new_from_array([9u8; 32]);
        let positions = vec![Position {
            token,
            kind: PositionKind::Deposit,
            balance: deposit,
        }];
        let mut configs = HashMap::new();
        configs.insert(token, PoolConfig {
            collateral_weight_bps: weight_bps,
            max_leverage_bps: 40_000,
        });
        let mut prices = HashMap::new();
        prices.insert(token, 1_000_000u64);

        let snapshot = positions.clone();
        let before = risk::valuate(&positions, &configs, &prices).unwrap();
        let after = risk::project_after_action(
            &positions, &configs, &prices, token, borrow, Action::Borrow,
        ).unwrap();

        prop_assert_eq!(positions, snapshot);
        prop_assert!(after.risk_indicator >= before.risk_indicator);
        prop_assert!(after.borrowed_value >= before.borrowed_value);
    }
}
