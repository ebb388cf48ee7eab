//! Read-only view over the resting-order slabs
//!
//! Decoded bid/ask slabs become price-time-ordered sequences for
//! display and for choosing a limit price that is guaranteed to rest
//! (strictly outside the best opposing price) versus one guaranteed to
//! cross.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::{Result, TenorError};
use crate::state::{OrderbookSide, Side};
use tenor_math::fp32_mul;

pub use crate::state::Side as BookSide;

/// One resting order, price-time ordered within its side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOrder {
    pub order_id: u128,
    pub owner: Pubkey,
    /// fp32 limit price
    pub price: u64,
    /// Remaining base (ticket) quantity
    pub base_size: u64,
    pub timestamp: i64,
}

impl BookOrder {
    /// Quote value of the remaining base at this order's price
    pub fn quote_size(&self) -> Result<u64> {
        fp32_mul(self.base_size, self.price).map_err(TenorError::from)
    }
}

/// Two-sided book snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookView {
    /// Descending price, earliest first within a level
    pub bids: Vec<BookOrder>,
    /// Ascending price, earliest first within a level
    pub asks: Vec<BookOrder>,
}

impl OrderbookView {
    /// Build the view from the two decoded slabs
    pub fn from_slabs(bids: &OrderbookSide, asks: &OrderbookSide) -> Result<Self> {
        if bids.side != Side::Bid || asks.side != Side::Ask {
            return Err(TenorError::InvalidOrderParams(
                "slab sides do not match their roles",
            ));
        }

        let mut bid_orders: Vec<BookOrder> = bids.entries.iter().map(to_order).collect();
        let mut ask_orders: Vec<BookOrder> = asks.entries.iter().map(to_order).collect();

        bid_orders.sort_by_key(|o| (std::cmp::Reverse(o.price), o.timestamp));
        ask_orders.sort_by_key(|o| (o.price, o.timestamp));

        Ok(Self {
            bids: bid_orders,
            asks: ask_orders,
        })
    }

    pub fn best_bid(&self) -> Option<&BookOrder> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookOrder> {
        self.asks.first()
    }

    /// Find a resting order by id on either side
    pub fn find(&self, order_id: u128) -> Result<&BookOrder> {
        self.bids
            .iter()
            .chain(self.asks.iter())
            .find(|o| o.order_id == order_id)
            .ok_or(TenorError::OrderNotFound(order_id))
    }

    /// Highest price at which an order on `side` is guaranteed to rest
    ///
    /// Strictly outside the best opposing price. `None` means the
    /// opposing side is empty and any limit price rests.
    pub fn resting_limit_price(&self, side: Side) -> Option<u64> {
        match side {
            Side::Bid => self.best_ask().map(|a| a.price.saturating_sub(1)),
            Side::Ask => self.best_bid().map(|b| b.price.saturating_add(1)),
        }
    }

    /// Limit price at which an order on `side` is guaranteed to cross
    ///
    /// `None` means the opposing side is empty and nothing can cross.
    pub fn crossing_limit_price(&self, side: Side) -> Option<u64> {
        match side {
            Side::Bid => self.best_ask().map(|a| a.price),
            Side::Ask => self.best_bid().map(|b| b.price),
        }
    }
}

fn to_order(entry: &crate::state::SlabEntry) -> BookOrder {
    BookOrder {
        order_id: entry.order_id,
        owner: entry.owner,
        price: entry.price(),
        base_size: entry.base_size,
        timestamp: entry.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SlabEntry, SUPPORTED_VERSION};

    fn entry(price: u64, seq: u64, base_size: u64, timestamp: i64) -> SlabEntry {
        SlabEntry {
            order_id: ((price as u128) << 64) | seq as u128,
            owner: Pubkey::new_unique(),
            base_size,
            timestamp,
        }
    }

    fn slab(side: Side, entries: Vec<SlabEntry>) -> OrderbookSide {
        OrderbookSide {
            version: SUPPORTED_VERSION,
            side,
            entries,
        }
    }

    fn book() -> OrderbookView {
        let bids = slab(
            Side::Bid,
            vec![
                entry(90, 1, 100, 10),
                entry(95, 2, 200, 30),
                entry(95, 3, 50, 20),
            ],
        );
        let asks = slab(
            Side::Ask,
            vec![
                entry(105, 4, 100, 40),
                entry(101, 5, 300, 10),
                entry(101, 6, 25, 5),
            ],
        );
        OrderbookView::from_slabs(&bids, &asks).unwrap()
    }

    #[test]
    fn test_price_time_ordering() {
        let view = book();

        let bid_prices: Vec<u64> = view.bids.iter().map(|o| o.price).collect();
        assert_eq!(bid_prices, vec![95, 95, 90]);
        // earliest first within the 95 level
        assert_eq!(view.bids[0].timestamp, 20);
        assert_eq!(view.bids[1].timestamp, 30);

        let ask_prices: Vec<u64> = view.asks.iter().map(|o| o.price).collect();
        assert_eq!(ask_prices, vec![101, 101, 105]);
        assert_eq!(view.asks[0].timestamp, 5);
    }

    #[test]
    fn test_best_levels_and_price_selection() {
        let view = book();
        assert_eq!(view.best_bid().unwrap().price, 95);
        assert_eq!(view.best_ask().unwrap().price, 101);

        // a bid at 100 rests (best ask is 101); at 101 it crosses
        assert_eq!(view.resting_limit_price(Side::Bid), Some(100));
        assert_eq!(view.crossing_limit_price(Side::Bid), Some(101));

        // an ask at 96 rests (best bid is 95); at 95 it crosses
        assert_eq!(view.resting_limit_price(Side::Ask), Some(96));
        assert_eq!(view.crossing_limit_price(Side::Ask), Some(95));
    }

    #[test]
    fn test_empty_opposing_side() {
        let view = OrderbookView::from_slabs(
            &slab(Side::Bid, vec![]),
            &slab(Side::Ask, vec![entry(101, 1, 10, 0)]),
        )
        .unwrap();
        assert_eq!(view.resting_limit_price(Side::Ask), None);
        assert_eq!(view.crossing_limit_price(Side::Ask), None);
    }

    #[test]
    fn test_mismatched_sides_rejected() {
        let bids = slab(Side::Bid, vec![]);
        assert!(OrderbookView::from_slabs(&bids, &bids).is_err());
    }

    #[test]
    fn test_find_missing_order() {
        let view = book();
        assert!(matches!(
            view.find(0xdead),
            Err(TenorError::OrderNotFound(0xdead))
        ));
        let id = view.bids[0].order_id;
        assert_eq!(view.find(id).unwrap().order_id, id);
    }

    #[test]
    fn test_quote_size_uses_fp32_price() {
        let order = BookOrder {
            order_id: 0,
            owner: Pubkey::new_unique(),
            price: 1 << 31, // half of face value
            base_size: 1_000,
            timestamp: 0,
        };
        assert_eq!(order.quote_size().unwrap(), 500);
    }
}
