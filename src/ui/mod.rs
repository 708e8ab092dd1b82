// UI module for the form rendering
pub mod form_view;
