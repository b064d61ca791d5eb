use uuid::Uuid;

use super::cart::CartService;
use super::Outcome;
use crate::db::Store;
use crate::dto::MyOrderResponse;
use crate::error::{AppError, AppResult};
use crate::models::order::Order;

pub struct OrderService;

impl OrderService {
    /// Turn every pending line of the member's cart into one order.
    pub async fn checkout(store: &dyn Store, member_id: Uuid) -> AppResult<Outcome<Order>> {
        let cart = store.find_or_create_cart(member_id).await?;
        let lines = store.find_pending_cart_products(cart.id).await?;
        if lines.is_empty() {
            return Err(AppError::Validation("Your cart is empty".into()));
        }

        let priced = CartService::priced_lines(store, lines).await?;
        let total_price = CartService::total(&priced)?;

        let order = Order::new(member_id, total_price);
        let mut lines = Vec::with_capacity(priced.len());
        for (mut line, _) in priced {
            line.connect_order(order.id)?;
            lines.push(line);
        }

        let order = store.place_order(&order, &lines).await?;

        tracing::info!(
            member_id = %member_id,
            order_id = %order.id,
            lines = lines.len(),
            total_price = order.total_price,
            "Order placed"
        );
        Ok(Outcome::new("Your order has been placed.", order))
    }

    pub async fn my_orders(store: &dyn Store, buyer_id: Uuid) -> AppResult<MyOrderResponse> {
        let orders = store.find_orders_by_buyer(buyer_id).await?;
        Ok(MyOrderResponse::new(orders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CartRepository, MemoryStore, OrderRepository};
    use crate::models::cart::Product;
    use crate::models::order::OrderStatus;

    #[tokio::test]
    async fn checkout_links_every_pending_line() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let vitamin = store.seed_product(Product::new("Vitamin C", 10_000)).await;
        let omega = store.seed_product(Product::new("Omega 3", 25_000)).await;

        let a = CartService::add_product(&store, member, vitamin.id, 2).await.unwrap().data;
        let b = CartService::add_product(&store, member, omega.id, 1).await.unwrap().data;

        let order = OrderService::checkout(&store, member).await.unwrap().data;
        assert_eq!(order.total_price, 45_000);
        assert_eq!(order.status, OrderStatus::Pending);

        for id in [a.id, b.id] {
            let line = store.find_cart_product(id).await.unwrap().unwrap();
            assert_eq!(line.order_id, Some(order.id));
        }
        assert!(CartService::view(&store, member).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_ordered() {
        let store = MemoryStore::new();
        let err = OrderService::checkout(&store, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn overflowing_total_places_no_order() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let pricey = store.seed_product(Product::new("Royal jelly", i64::MAX / 4)).await;
        let line = CartService::add_product(&store, member, pricey.id, 2).await.unwrap().data;
        CartService::add_product(&store, member, pricey.id, 1).await.unwrap();
        CartService::add_product(&store, member, pricey.id, 2).await.unwrap();

        let err = OrderService::checkout(&store, member).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(OrderService::my_orders(&store, member).await.unwrap().orders.is_empty());
        let line = store.find_cart_product(line.id).await.unwrap().unwrap();
        assert!(!line.is_ordered());
    }

    #[tokio::test]
    async fn ordered_line_cannot_be_relinked() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let product = store.seed_product(Product::new("Iron", 8_000)).await;
        let line = CartService::add_product(&store, member, product.id, 1).await.unwrap().data;
        OrderService::checkout(&store, member).await.unwrap();

        // A stale copy of the line still looks pending to the caller
        let second = Order::new(member, 8_000);
        let err = store.place_order(&second, &[line]).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(OrderService::my_orders(&store, member).await.unwrap().orders.len(), 1);
    }

    #[tokio::test]
    async fn my_orders_lists_only_the_buyers_orders() {
        let store = MemoryStore::new();
        let member = Uuid::new_v4();
        let product = store.seed_product(Product::new("Zinc", 3_000)).await;

        CartService::add_product(&store, member, product.id, 1).await.unwrap();
        OrderService::checkout(&store, member).await.unwrap();
        CartService::add_product(&store, member, product.id, 2).await.unwrap();
        OrderService::checkout(&store, member).await.unwrap();

        let mine = OrderService::my_orders(&store, member).await.unwrap();
        assert_eq!(mine.orders.len(), 2);
        assert!(mine.orders[0].created_at >= mine.orders[1].created_at);
        let mut totals: Vec<i64> = mine.orders.iter().map(|o| o.total_price).collect();
        totals.sort();
        assert_eq!(totals, vec![3_000, 6_000]);
        assert_eq!(
            mine.filtered_order_status,
            OrderStatus::management_statuses().to_vec()
        );

        let theirs = OrderService::my_orders(&store, Uuid::new_v4()).await.unwrap();
        assert!(theirs.orders.is_empty());
    }
}
