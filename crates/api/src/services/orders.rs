//! Order service.
//!
//! Every mutation of an existing order follows the same sequence: load (and
//! lock) the order, fail with a not-found error if it is absent, then check
//! that the actor is an admin or the order's owner. Item mutations finish by
//! recomputing the order total from a full scan of its items.

use thiserror::Error;

use order_desk_core::{OrderId, OrderItemId, OrderStatus, PriceError, UserId};

use crate::db::{OrderStore, RepositoryError, UserStore};
use crate::models::{NewOrderItem, Order, OrderItem, User, order_total};

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The line item does not exist.
    #[error("item {0} not found")]
    ItemNotFound(OrderItemId),

    /// The prospective owner has no account.
    #[error("user {0} not found")]
    OwnerNotFound(UserId),

    /// The actor is neither an admin nor the order's owner.
    #[error("not allowed to modify this order")]
    Forbidden,

    /// Only admins may list every order.
    #[error("only admins can list orders")]
    AdminOnly,

    /// A line or order total does not fit the price type.
    #[error("order total out of range: {0}")]
    TotalOutOfRange(#[from] PriceError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of removing a line item.
#[derive(Debug, Clone)]
pub struct ItemRemoved {
    /// The order with its recomputed total.
    pub order: Order,
    /// Items left on the order.
    pub remaining_item_count: usize,
}

/// Result of adding a line item.
#[derive(Debug, Clone)]
pub struct ItemAdded {
    pub item: OrderItem,
    /// The order with its recomputed total.
    pub order: Order,
}

/// Order service over one unit of work.
pub struct OrderService<'a, U> {
    unit: &'a mut U,
}

impl<'a, U: OrderStore + UserStore + Send> OrderService<'a, U> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(unit: &'a mut U) -> Self {
        Self { unit }
    }

    /// Create a `PENDING` order with a zero total for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OwnerNotFound` if `owner` has no account.
    pub async fn create_order(&mut self, owner: UserId) -> Result<Order, OrderError> {
        if self.unit.find_user_by_id(owner).await?.is_none() {
            return Err(OrderError::OwnerNotFound(owner));
        }

        let order = self.unit.insert_order(owner).await?;
        tracing::info!(order_id = %order.id, owner_user_id = %owner, "order created");
        Ok(order)
    }

    /// Cancel an order. Cancelling a cancelled order changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the order does not exist.
    /// Returns `OrderError::Forbidden` if `actor` may not manage the order.
    pub async fn cancel_order(&mut self, id: OrderId, actor: &User) -> Result<Order, OrderError> {
        let order = self.load_for_update(id, actor).await?;

        if order.status.is_cancelled() {
            return Ok(order);
        }

        let order = self
            .unit
            .update_order_status(id, OrderStatus::Cancelled)
            .await?;
        tracing::info!(order_id = %id, actor = %actor.id, "order cancelled");
        Ok(order)
    }

    /// Every order in the store, by id ascending, cancelled ones included.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::AdminOnly` unless `actor` is an admin.
    pub async fn list_orders(&mut self, actor: &User) -> Result<Vec<Order>, OrderError> {
        if !actor.is_admin {
            tracing::warn!(actor = %actor.id, "non-admin attempted to list orders");
            return Err(OrderError::AdminOnly);
        }

        Ok(self.unit.list_orders().await?)
    }

    /// Add a line item and recompute the order total.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the order does not exist.
    /// Returns `OrderError::Forbidden` if `actor` may not manage the order.
    /// Returns `OrderError::TotalOutOfRange` if the new total would not fit;
    /// nothing is inserted in that case.
    pub async fn add_item(
        &mut self,
        order_id: OrderId,
        item: NewOrderItem,
        actor: &User,
    ) -> Result<ItemAdded, OrderError> {
        let order = self.load_for_update(order_id, actor).await?;

        let line = item.unit_price.line_total(item.quantity)?;
        if let Err(err) = order.total_price.checked_add(line) {
            tracing::warn!(order_id = %order_id, %line, "order total out of range");
            return Err(err.into());
        }

        let item = self.unit.insert_item(order_id, item).await?;
        let (order, _) = self.recompute_total(order_id).await?;

        tracing::info!(
            order_id = %order_id,
            item_id = %item.id,
            total = %order.total_price,
            "item added"
        );
        Ok(ItemAdded { item, order })
    }

    /// Remove a line item and recompute its order's total.
    ///
    /// The item is looked up before its order, so a missing item is reported
    /// as such without touching any order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ItemNotFound` if the item does not exist.
    /// Returns `OrderError::OrderNotFound` if its order does not exist.
    /// Returns `OrderError::Forbidden` if `actor` may not manage the order.
    pub async fn remove_item(
        &mut self,
        item_id: OrderItemId,
        actor: &User,
    ) -> Result<ItemRemoved, OrderError> {
        let item = self
            .unit
            .find_item(item_id)
            .await?
            .ok_or(OrderError::ItemNotFound(item_id))?;

        self.load_for_update(item.order_id, actor).await?;

        if !self.unit.delete_item(item_id).await? {
            // Deleted by a concurrent request between lookup and lock.
            return Err(OrderError::ItemNotFound(item_id));
        }

        let (order, remaining_item_count) = self.recompute_total(item.order_id).await?;

        tracing::info!(
            order_id = %order.id,
            item_id = %item_id,
            total = %order.total_price,
            remaining_item_count,
            "item removed"
        );
        Ok(ItemRemoved {
            order,
            remaining_item_count,
        })
    }

    /// Lock an order for mutation after checking existence, then ownership.
    async fn load_for_update(&mut self, id: OrderId, actor: &User) -> Result<Order, OrderError> {
        let order = self
            .unit
            .lock_order(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        if !actor.can_manage(order.owner_user_id) {
            tracing::warn!(
                order_id = %id,
                actor = %actor.id,
                owner = %order.owner_user_id,
                "order access denied"
            );
            return Err(OrderError::Forbidden);
        }

        Ok(order)
    }

    /// Rescan the order's items and store the new total.
    async fn recompute_total(&mut self, id: OrderId) -> Result<(Order, usize), OrderError> {
        let items = self.unit.find_items_by_order(id).await?;
        let total = order_total(&items)?;
        let order = self.unit.update_order_total(id, total).await?;
        Ok((order, items.len()))
    }
}
