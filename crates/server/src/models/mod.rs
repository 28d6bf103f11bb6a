//! Domain models backing the repositories.

pub mod notification;
pub mod shipment;
pub mod token;
pub mod user;

pub use notification::Notification;
pub use shipment::ShipmentRecord;
pub use token::Token;
pub use user::User;
