// Client session state: the signed-in user and the theme preference

pub mod auth;
pub mod theme;

pub use auth::{AuthSession, SessionState};
pub use theme::{
    DocumentRoot, FixedPreference, PresentationTarget, SystemPreference, Theme, ThemeMode,
    ThemeState, ThemeStore,
};
