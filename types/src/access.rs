//! Which page a visitor may see, given what we know about their session.

use crate::AuthSnapshot;

/// The access tier a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// The sign-in page; always reachable.
    Public,
    /// Any signed-in user.
    Member,
    /// Signed-in users whose role is `admin`.
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Render,
    /// The first session check hasn't finished; render nothing protected.
    Pending,
    RedirectToSignIn,
    RedirectToDashboard,
}

pub fn decide(area: Area, auth: &AuthSnapshot) -> Access {
    if area == Area::Public {
        return Access::Render;
    }
    if auth.loading {
        return Access::Pending;
    }

    let Some(session) = &auth.session else {
        return Access::RedirectToSignIn;
    };

    match area {
        // A failed or empty role lookup already resolved to `member` on the
        // server, so it lands here as well.
        Area::Admin if !session.is_admin() => Access::RedirectToDashboard,
        _ => Access::Render,
    }
}
