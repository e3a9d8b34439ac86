// Application layer - Use cases and collaborator traits
pub mod dashboard_service;
pub mod data_manager;
pub mod figure_builder;
pub mod inference_trigger;
pub mod reactive;
pub mod session;
pub mod view_synchronizer;
