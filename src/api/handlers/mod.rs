pub mod desktop;
pub mod handoff;
pub mod health;
