pub mod bridge;
pub mod describe;
pub mod dom;
pub mod engine;
pub mod logging;
pub mod navigation;
pub mod overlay;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod shortcut;
pub mod speech;
pub mod tracker;
