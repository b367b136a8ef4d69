//! In-process store.
//!
//! All tables live behind one async mutex. A unit of work holds the lock for
//! its whole lifetime and edits a private copy of the tables, which replaces
//! the shared tables on commit. Units of work are therefore fully serialized.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use order_desk_core::{Email, OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::{OrderStore, RepositoryError, Store, UnitOfWork, UserStore};
use crate::models::{NewOrderItem, NewUser, Order, OrderItem, User};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderItemId, OrderItem>,
    last_user_id: i32,
    last_order_id: i32,
    last_item_id: i32,
}

/// Store keeping everything in memory. Data is lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, RepositoryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(MemoryUnit { guard, work })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Exclusive unit of work over a [`MemoryStore`].
pub struct MemoryUnit {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

impl UnitOfWork for MemoryUnit {
    async fn commit(self) -> Result<(), RepositoryError> {
        let Self { mut guard, work } = self;
        *guard = work;
        Ok(())
    }
}

impl UserStore for MemoryUnit {
    async fn find_user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .work
            .users
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, RepositoryError> {
        if self.work.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        self.work.last_user_id += 1;
        let created = User {
            id: UserId::new(self.work.last_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            active: user.active,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        self.work.users.insert(created.id, created.clone());
        Ok(created)
    }
}

impl OrderStore for MemoryUnit {
    async fn insert_order(&mut self, owner: UserId) -> Result<Order, RepositoryError> {
        if !self.work.users.contains_key(&owner) {
            return Err(RepositoryError::NotFound);
        }

        self.work.last_order_id += 1;
        let order = Order {
            id: OrderId::new(self.work.last_order_id),
            owner_user_id: owner,
            status: OrderStatus::Pending,
            total_price: Price::ZERO,
            created_at: Utc::now(),
        };
        self.work.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        // The unit already holds the store lock.
        self.find_order(id).await
    }

    async fn list_orders(&mut self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.work.orders.values().cloned().collect())
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = self
            .work
            .orders
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        Ok(order.clone())
    }

    async fn update_order_total(
        &mut self,
        id: OrderId,
        total: Price,
    ) -> Result<Order, RepositoryError> {
        let order = self
            .work
            .orders
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        order.total_price = total;
        Ok(order.clone())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<bool, RepositoryError> {
        if self.work.orders.remove(&id).is_none() {
            return Ok(false);
        }
        self.work.items.retain(|_, item| item.order_id != id);
        Ok(true)
    }

    async fn insert_item(
        &mut self,
        order_id: OrderId,
        item: NewOrderItem,
    ) -> Result<OrderItem, RepositoryError> {
        if !self.work.orders.contains_key(&order_id) {
            return Err(RepositoryError::NotFound);
        }

        self.work.last_item_id += 1;
        let created = OrderItem {
            id: OrderItemId::new(self.work.last_item_id),
            order_id,
            quantity: item.quantity,
            flavor: item.flavor,
            size: item.size,
            unit_price: item.unit_price,
        };
        self.work.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_item(&mut self, id: OrderItemId) -> Result<Option<OrderItem>, RepositoryError> {
        Ok(self.work.items.get(&id).cloned())
    }

    async fn delete_item(&mut self, id: OrderItemId) -> Result<bool, RepositoryError> {
        Ok(self.work.items.remove(&id).is_some())
    }

    async fn find_items_by_order(
        &mut self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self
            .work
            .items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }
}
