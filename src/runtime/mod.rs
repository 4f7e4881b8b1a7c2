// src/runtime/mod.rs

//! Lifecycle notifications: the event bus and the events it carries.

pub mod event_bus;
pub mod system_events;

pub use event_bus::EventBus;
pub use system_events::LifecycleEvent;
