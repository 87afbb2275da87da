pub mod accounts;
pub mod guard;
pub mod identity;
pub mod inspector;
pub mod reconcile;
pub mod repair;
pub mod rule;
pub mod seed;
