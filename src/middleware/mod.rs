pub mod bot_token;
pub mod request_id;
