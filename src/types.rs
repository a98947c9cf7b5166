//! Shared identifiers and the order model passed between customers and cooks.

/// Number assigned to an order when the queue accepts it.
pub type OrderNumber = u64;
/// Identifier of the customer thread that placed an order.
pub type CustomerId = u64;
/// Identifier of a cook thread.
pub type CookId = u64;
/// Opaque menu item carried by an order.
pub type MenuItem = &'static str;

/// An order as built by a customer, before the queue numbers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRequest {
    pub item: MenuItem,
    pub customer_id: CustomerId,
}

impl OrderRequest {
    pub fn new(item: MenuItem, customer_id: CustomerId) -> Self {
        Self { item, customer_id }
    }
}

/// A numbered order owned by the queue, then by the cook that took it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    number: OrderNumber,
    /// What the customer asked for.
    pub item: MenuItem,
    /// Who asked for it.
    pub customer_id: CustomerId,
}

impl Order {
    /// Only the queue numbers orders; see `OrderQueue::submit`.
    pub(crate) fn accept(request: OrderRequest, number: OrderNumber) -> Self {
        Self {
            number,
            item: request.item,
            customer_id: request.customer_id,
        }
    }

    pub fn number(&self) -> OrderNumber {
        self.number
    }
}
