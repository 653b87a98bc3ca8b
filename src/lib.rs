pub mod config;
pub mod dispatch;
pub mod editor;
pub mod focus;
pub mod host;
pub mod prefs;
pub mod scan;

mod app;

pub use app::*;
pub use dispatch::{Action, CommandKey, KeyToken, Route};
pub use focus::FocusTarget;
pub use host::{ConnectionStatus, HostMessage, WebviewMessage};
