/// UI module exports
pub mod side_panel;
