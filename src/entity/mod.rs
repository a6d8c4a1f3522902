pub mod orders;
pub mod subscriptions;

pub use orders::Entity as Orders;
pub use subscriptions::Entity as Subscriptions;
