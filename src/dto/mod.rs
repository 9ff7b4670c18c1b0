pub mod auth_dto;
pub mod message_dto;
pub mod verification_dto;
pub mod video_dto;
pub mod wallet_dto;
