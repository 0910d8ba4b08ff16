//! PlaceOrder command handler
//!
//! Creates an order from a checkout request: validates the request,
//! reserves stock for every line item (all-or-nothing), captures
//! immutable line-item snapshots, and computes the totals.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::fulfillment::traits::{
    CommandContext, CommandHandler, CommandMetadata, FulfillmentError,
};
use crate::inventory::ledger;
use shared::models::AddressSnapshot;
use shared::order::{
    ActorRole, EventPayload, LineItemInput, LineItemSnapshot, OrderEvent, OrderEventType,
    OrderTotals,
};

/// PlaceOrder action
#[derive(Debug, Clone)]
pub struct PlaceOrderAction {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub address: AddressSnapshot,
    pub items: Vec<LineItemInput>,
    pub shipping_fee: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    /// Server-generated order number (crash-safe counter, never reused)
    pub order_number: String,
}

impl PlaceOrderAction {
    fn validate(&self, metadata: &CommandMetadata) -> Result<(), FulfillmentError> {
        match metadata.actor.role {
            ActorRole::Admin => {}
            ActorRole::Buyer if metadata.actor.id == self.buyer_id => {}
            ActorRole::Buyer => {
                return Err(FulfillmentError::NotAuthorized(
                    "buyer can only place orders for themselves".to_string(),
                ));
            }
            role => {
                return Err(FulfillmentError::NotAuthorized(format!(
                    "{role} cannot place orders"
                )));
            }
        }

        if self.items.is_empty() {
            return Err(FulfillmentError::Validation(
                "order must contain at least one line item".to_string(),
            ));
        }
        for item in &self.items {
            if item.quantity <= 0 {
                return Err(FulfillmentError::Validation(format!(
                    "quantity must be positive, got {} for variant {}",
                    item.quantity, item.variant_id
                )));
            }
            if item.unit_price < Decimal::ZERO {
                return Err(FulfillmentError::Validation(format!(
                    "unit price must be non-negative, got {} for variant {}",
                    item.unit_price, item.variant_id
                )));
            }
        }
        for (name, amount) in [
            ("shipping_fee", self.shipping_fee),
            ("tax", self.tax),
            ("discount", self.discount),
        ] {
            if amount < Decimal::ZERO {
                return Err(FulfillmentError::Validation(format!(
                    "{name} must be non-negative, got {amount}"
                )));
            }
        }
        if self.address.city.trim().is_empty() {
            return Err(FulfillmentError::Validation(
                "shipping address needs a city".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for PlaceOrderAction {
    async fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<OrderEvent>, FulfillmentError> {
        self.validate(metadata)?;

        // Reserve stock in ascending variant-id order. Any failure
        // aborts the enclosing transaction, so partial reservations
        // never persist.
        let mut items = self.items.clone();
        items.sort_by_key(|i| i.variant_id);

        let mut snapshots: Vec<LineItemSnapshot> = Vec::with_capacity(items.len());
        for item in &items {
            let variant = ledger::reserve(ctx, item.variant_id, item.quantity as i64)?;
            let quantity = Decimal::from(item.quantity);
            snapshots.push(LineItemSnapshot {
                variant_id: variant.id,
                product_id: variant.product_id,
                product_name: variant.product_name.clone(),
                sku: variant.sku.clone(),
                size: variant.size.clone(),
                color: variant.color.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_subtotal: item.unit_price * quantity,
            });
        }

        let subtotal: Decimal = snapshots.iter().map(|i| i.line_subtotal).sum();
        let totals = OrderTotals::compute(subtotal, self.shipping_fee, self.tax, self.discount);

        let order_id = Uuid::new_v4().to_string();
        let seq = ctx.next_sequence();

        info!(
            order_id = %order_id,
            order_number = %self.order_number,
            buyer_id = self.buyer_id,
            seller_id = self.seller_id,
            item_count = snapshots.len(),
            total = %totals.total,
            "Placing order"
        );

        let event = OrderEvent::new(
            seq,
            order_id,
            metadata.actor,
            metadata.command_id.clone(),
            Some(metadata.timestamp),
            OrderEventType::OrderPlaced,
            EventPayload::OrderPlaced {
                order_number: self.order_number.clone(),
                buyer_id: self.buyer_id,
                seller_id: self.seller_id,
                address: self.address.clone(),
                items: snapshots,
                totals,
            },
        );

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fulfillment::storage::FulfillmentStorage;
    use shared::models::ProductVariant;
    use shared::order::Actor;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn metadata(actor: Actor) -> CommandMetadata {
        CommandMetadata {
            command_id: "cmd-1".to_string(),
            actor,
            timestamp: 1234567890,
        }
    }

    fn test_address() -> AddressSnapshot {
        AddressSnapshot {
            full_name: "Test Buyer".to_string(),
            phone: "0900000000".to_string(),
            street: "1 Main St".to_string(),
            city: "Quezon City".to_string(),
            province: "Metro Manila".to_string(),
            postal_code: Some("1100".to_string()),
        }
    }

    fn seed_variant(storage: &FulfillmentStorage, sku: &str, on_hand: i64) -> i64 {
        let mut variant = ProductVariant::new(10, "Shirt", sku, dec("19.99"), on_hand);
        variant.size = Some("M".to_string());
        let id = variant.id;
        storage.upsert_variant(&variant).unwrap();
        id
    }

    fn action(items: Vec<LineItemInput>) -> PlaceOrderAction {
        PlaceOrderAction {
            buyer_id: 1,
            seller_id: 2,
            address: test_address(),
            items,
            shipping_fee: dec("5.00"),
            tax: dec("0.00"),
            discount: dec("0.00"),
            order_number: "ORD-20260807-00001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_place_order_reserves_and_snapshots() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let variant_id = seed_variant(&storage, "SH-M", 10);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action(vec![LineItemInput {
            variant_id,
            quantity: 3,
            unit_price: dec("19.99"),
        }]);

        let events = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, OrderEventType::OrderPlaced);

        // Stock is reserved, not decremented
        let variant = ctx.variant(variant_id).unwrap();
        assert_eq!(variant.reserved, 3);
        assert_eq!(variant.on_hand, 10);

        if let EventPayload::OrderPlaced {
            order_number,
            items,
            totals,
            ..
        } = &events[0].payload
        {
            assert_eq!(order_number, "ORD-20260807-00001");
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].sku, "SH-M");
            assert_eq!(items[0].size.as_deref(), Some("M"));
            assert_eq!(items[0].line_subtotal, dec("59.97"));
            assert_eq!(totals.subtotal, dec("59.97"));
            assert_eq!(totals.total, dec("64.97"));
            assert!(totals.is_consistent());
        } else {
            panic!("Expected OrderPlaced payload");
        }
    }

    #[tokio::test]
    async fn test_place_order_insufficient_stock() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let variant_id = seed_variant(&storage, "SH-M", 2);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action(vec![LineItemInput {
            variant_id,
            quantity: 3,
            unit_price: dec("19.99"),
        }]);

        let result = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_place_order_multi_item_failure_is_all_or_nothing() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let plenty = seed_variant(&storage, "SH-M", 10);
        let scarce = seed_variant(&storage, "SH-L", 1);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action(vec![
            LineItemInput {
                variant_id: plenty,
                quantity: 2,
                unit_price: dec("19.99"),
            },
            LineItemInput {
                variant_id: scarce,
                quantity: 5,
                unit_price: dec("21.99"),
            },
        ]);

        let result = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await;
        assert!(result.is_err());
        // The manager drops the transaction on error: nothing commits.
        drop(ctx);
        drop(txn);

        let v = storage.get_variant(plenty).unwrap().unwrap();
        assert_eq!(v.reserved, 0);
    }

    #[tokio::test]
    async fn test_place_order_rejects_wrong_buyer() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let variant_id = seed_variant(&storage, "SH-M", 10);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action(vec![LineItemInput {
            variant_id,
            quantity: 1,
            unit_price: dec("19.99"),
        }]);

        // Actor id 99 placing for buyer 1
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(99, ActorRole::Buyer)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));

        // Sellers cannot place orders at all
        let result = action
            .execute(&mut ctx, &metadata(Actor::new(2, ActorRole::Seller)))
            .await;
        assert!(matches!(result, Err(FulfillmentError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_place_order_rejects_bad_input() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let variant_id = seed_variant(&storage, "SH-M", 10);

        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);
        let meta = metadata(Actor::new(1, ActorRole::Buyer));

        let empty = action(vec![]);
        assert!(matches!(
            empty.execute(&mut ctx, &meta).await,
            Err(FulfillmentError::Validation(_))
        ));

        let zero_qty = action(vec![LineItemInput {
            variant_id,
            quantity: 0,
            unit_price: dec("19.99"),
        }]);
        assert!(matches!(
            zero_qty.execute(&mut ctx, &meta).await,
            Err(FulfillmentError::Validation(_))
        ));

        let negative_price = action(vec![LineItemInput {
            variant_id,
            quantity: 1,
            unit_price: dec("-1.00"),
        }]);
        assert!(matches!(
            negative_price.execute(&mut ctx, &meta).await,
            Err(FulfillmentError::Validation(_))
        ));

        let mut negative_fee = action(vec![LineItemInput {
            variant_id,
            quantity: 1,
            unit_price: dec("19.99"),
        }]);
        negative_fee.discount = dec("-3.00");
        assert!(matches!(
            negative_fee.execute(&mut ctx, &meta).await,
            Err(FulfillmentError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_place_order_unknown_variant() {
        let storage = FulfillmentStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage, 0);

        let action = action(vec![LineItemInput {
            variant_id: 404,
            quantity: 1,
            unit_price: dec("19.99"),
        }]);

        let result = action
            .execute(&mut ctx, &metadata(Actor::new(1, ActorRole::Buyer)))
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::VariantNotFound(404))
        ));
    }
}
