use uuid::Uuid;

use super::Outcome;
use crate::db::Store;
use crate::dto::{CartLineResponse, CartResponse};
use crate::error::{AppError, AppResult};
use crate::models::cart::{CartProduct, Product, MAX_QUANTITY};

pub struct CartService;

impl CartService {
    /// Put `quantity` of a product into the member's cart. A pending line for
    /// the same product absorbs the quantity instead of adding a second line.
    pub async fn add_product(
        store: &dyn Store,
        member_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> AppResult<Outcome<CartProduct>> {
        if quantity < 1 {
            return Err(AppError::Validation("Quantity must be at least 1".into()));
        }

        let product = store
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
        let cart = store.find_or_create_cart(member_id).await?;

        let pending = store.find_pending_cart_products(cart.id).await?;
        let line = match pending.into_iter().find(|l| l.product_id == product.id) {
            Some(mut line) => {
                let merged = line.quantity.checked_add(quantity).ok_or_else(|| {
                    AppError::Validation(format!("Quantity must be at most {MAX_QUANTITY}"))
                })?;
                line.update_quantity(merged)?;
                line
            }
            None => CartProduct::new(cart.id, product.id, quantity)?,
        };
        let line = store.save_cart_product(&line).await?;

        tracing::info!(
            member_id = %member_id,
            product_id = %product.id,
            quantity = line.quantity,
            "Product added to cart"
        );
        Ok(Outcome::new(
            format!("{} has been added to your cart.", product.name),
            line,
        ))
    }

    pub async fn update_quantity(
        store: &dyn Store,
        member_id: Uuid,
        cart_product_id: Uuid,
        quantity: i64,
    ) -> AppResult<Outcome<CartProduct>> {
        let mut line = store
            .find_cart_product(cart_product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".into()))?;

        let cart = store.find_or_create_cart(member_id).await?;
        if line.cart_id != cart.id {
            return Err(AppError::Forbidden(
                "You can only change your own cart".into(),
            ));
        }

        line.update_quantity(quantity)?;
        let line = store.save_cart_product(&line).await?;

        Ok(Outcome::new("Quantity has been updated.", line))
    }

    pub async fn view(store: &dyn Store, member_id: Uuid) -> AppResult<CartResponse> {
        let cart = store.find_or_create_cart(member_id).await?;
        let lines = store.find_pending_cart_products(cart.id).await?;
        let priced = Self::priced_lines(store, lines).await?;

        let total = Self::total(&priced)?;
        let lines = priced
            .into_iter()
            .map(|(line, product)| -> AppResult<CartLineResponse> {
                Ok(CartLineResponse {
                    id: line.id,
                    subtotal: line.subtotal(product.price)?,
                    product_id: product.id,
                    product_name: product.name,
                    price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CartResponse { lines, total })
    }

    /// Sum of every line's subtotal, refused instead of wrapping.
    pub(crate) fn total(priced: &[(CartProduct, Product)]) -> AppResult<i64> {
        priced.iter().try_fold(0i64, |total, (line, product)| {
            total
                .checked_add(line.subtotal(product.price)?)
                .ok_or_else(|| AppError::Validation("Cart total is too large".into()))
        })
    }

    /// Pair each line with its product. A line whose product has left the
    /// catalogue cannot be priced and fails the whole call.
    pub(crate) async fn priced_lines(
        store: &dyn Store,
        lines: Vec<CartProduct>,
    ) -> AppResult<Vec<(CartProduct, Product)>> {
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let product = store.find_product(line.product_id).await?.ok_or_else(|| {
                AppError::NotFound("A product in your cart is no longer available".into())
            })?;
            priced.push((line, product));
        }
        Ok(priced)
    }
}
