//! Suite-level specs

mod attempts;
mod concurrent;
mod inspect;
mod resume;
mod stop;
