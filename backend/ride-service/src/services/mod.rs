pub mod identity;
pub mod mailer;
pub mod memory_store;
pub mod notification_store;
pub mod notifier;
pub mod offer_service;
pub mod passenger_service;
pub mod route_service;
pub mod texts;
pub mod user_service;

pub use identity::IdentityService;
pub use mailer::{LogMailer, Mailer};
pub use memory_store::MemoryNotificationStore;
pub use notification_store::{NotificationStore, PgNotificationStore};
pub use notifier::{DeliveryReport, Notifier};
pub use offer_service::OfferService;
pub use passenger_service::PassengerService;
pub use route_service::RouteService;
pub use user_service::UserService;
