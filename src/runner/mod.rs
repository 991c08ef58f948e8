//! @ai:module:intent Chat API access for the judge: client, pacing and retries
//! @ai:module:layer infrastructure
//! @ai:module:public_api ChatClient, ChatClientTrait, MockChatClient, RateLimiter, RetryPolicy

pub mod client;
pub mod rate_limiter;
pub mod retry;

pub use client::{ChatClient, ChatClientTrait, ChatResponse, ClientError, MockChatClient};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
