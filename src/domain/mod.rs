// Domain layer - Dashboards, widgets and their catalog
pub mod dashboard;
pub mod layout;
pub mod registry;
pub mod template;
pub mod widget;
pub mod widget_config;
