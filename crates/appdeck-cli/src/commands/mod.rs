pub mod apps;
pub mod buttons;
pub mod webhooks;
