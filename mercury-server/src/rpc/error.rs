//! Typed RPC errors with the stable code/message pairs clients match on.

use mercury_tl::types;

/// An error to be returned to the caller as `rpc_error`.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn user_id_invalid() -> Self {
        Self { code: 400, message: "USER_ID_INVALID".into() }
    }

    pub fn phone_number_invalid() -> Self {
        Self { code: 400, message: "PHONE_NUMBER_INVALID".into() }
    }

    pub fn auth_key_invalid() -> Self {
        Self { code: 401, message: "AUTH_KEY_INVALID".into() }
    }

    pub fn session_password_needed() -> Self {
        Self { code: 401, message: "SESSION_PASSWORD_NEEDED".into() }
    }

    pub fn flood_wait(seconds: u32) -> Self {
        Self { code: 420, message: format!("FLOOD_WAIT_{seconds}") }
    }

    /// The wire form.
    pub fn to_tl(&self) -> types::RpcError {
        types::RpcError { error_code: self.code, error_message: self.message.clone() }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(RpcError::user_id_invalid().message, "USER_ID_INVALID");
        assert_eq!(RpcError::user_id_invalid().code, 400);
        assert_eq!(RpcError::auth_key_invalid().code, 401);
        assert_eq!(RpcError::flood_wait(30).message, "FLOOD_WAIT_30");
    }
}
