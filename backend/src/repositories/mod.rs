pub mod company_repository;
pub mod message_repository;
pub mod project_repository;
pub mod refresh_token_repository;
pub mod user_repository;
