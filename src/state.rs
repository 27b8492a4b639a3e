pub mod app_settings;
