//! Terminal front end: one-shot commands and the interactive view

pub mod convert;
pub mod rates;
pub mod setup;
pub mod ui;
pub mod view;
pub mod watch;
