use dioxus::prelude::*;

const UNAUTHORIZED: u16 = 401;

/// The message to show for a failed server call.
pub fn describe(err: &ServerFnError) -> String {
    match err {
        ServerFnError::ServerError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Whether the server no longer recognises our session.
pub fn is_unauthorized(err: &ServerFnError) -> bool {
    matches!(err, ServerFnError::ServerError { code, .. } if *code == UNAUTHORIZED)
}
