//! Notification bodies for the reset workflow.
//!
//! Instants are converted to the display offset here and nowhere else.

use chrono::{DateTime, FixedOffset, Utc};

use crate::models::auth::Principal;
use crate::notify::Message;

fn display_time(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant
        .with_timezone(&offset)
        .format("%d %b %Y, %H:%M (UTC%:z)")
        .to_string()
}

/// Email carrying a freshly issued reset code.
pub fn otp_message(
    principal: &Principal,
    code: &str,
    expires_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Message {
    Message {
        subject: "Your password reset code".into(),
        html_body: format!(
            "<p>Hello {username},</p>\
             <p>A password reset was requested for your {label} account.</p>\
             <p>Your one-time code is <strong>{code}</strong>.</p>\
             <p>It can be used once and expires at {expires}.</p>\
             <p>If you did not request this, you can ignore this email.</p>",
            username = principal.username,
            label = principal.kind.label(),
            expires = display_time(expires_at, offset),
        ),
    }
}

/// Email confirming a completed reset.
pub fn reset_confirmation(principal: &Principal, at: DateTime<Utc>, offset: FixedOffset) -> Message {
    Message {
        subject: "Your password has been reset".into(),
        html_body: format!(
            "<p>Hello {username},</p>\
             <p>The password for your {label} account was reset on {at}.</p>\
             <p>If this was not you, contact your HR administrator immediately.</p>",
            username = principal.username,
            label = principal.kind.label(),
            at = display_time(at, offset),
        ),
    }
}

/// Email confirming a password change made while signed in.
pub fn change_confirmation(
    principal: &Principal,
    at: DateTime<Utc>,
    offset: FixedOffset,
) -> Message {
    Message {
        subject: "Your password has been changed".into(),
        html_body: format!(
            "<p>Hello {username},</p>\
             <p>The password for your {label} account was changed on {at}.</p>\
             <p>If this was not you, reset your password and contact your HR administrator.</p>",
            username = principal.username,
            label = principal.kind.label(),
            at = display_time(at, offset),
        ),
    }
}
