//! Reusable UI components.

pub mod graph_view;
