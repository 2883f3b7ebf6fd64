pub mod auth_service;
pub mod refresh_service;
pub mod token_service;
pub mod token_validator;
