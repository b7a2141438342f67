#![forbid(unsafe_code)]

pub mod remote;
pub mod rest;
pub mod token;
pub mod wire;

pub use remote::{
    AuthGateway, AuthSession, ExamGateway, GatewayError, InMemoryGateway, NewProfile, OtpOutcome,
    ProfileImage, UserProfile,
};
pub use rest::{GatewayConfig, RestGateway};
pub use token::{InMemoryTokenStore, TokenPair, TokenStore};
