//! Presentational building blocks shared by the pages.

mod alert;
mod badge;
mod modal;
mod pager;

pub use alert::Alert;
pub use badge::{Badge, BadgeTone};
pub use modal::Modal;
pub use pager::{Pager, page_window};
