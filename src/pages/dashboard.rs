//! Dashboard views. Everything here sits behind the route guard.

use std::fmt::Write;

use crate::net::types::User;
use crate::routes::Route;

/// Dashboard landing view for the signed-in user.
#[must_use]
pub fn render(user: &User) -> String {
    let mut out = format!("Dashboard\nWelcome back, {}!\n", user.name);
    let _ = writeln!(out, "  email:  {}", user.email);
    let _ = writeln!(out, "  role:   {}", user.role);
    if let Some(avatar) = &user.avatar_url {
        let _ = writeln!(out, "  avatar: {avatar}");
    }
    out.push_str("Sections: /dashboard/customers  /dashboard/albums  /dashboard/orders  /dashboard/settings");
    out
}

/// Secondary dashboard sections.
#[must_use]
pub fn render_section(route: Route) -> String {
    match route {
        Route::Orders | Route::Settings => format!("{} Page (Coming soon)", route.title()),
        Route::Albums => format!("{}\nBrowse with `launchpad api albums`.", route.title()),
        other => other.title().to_owned(),
    }
}
