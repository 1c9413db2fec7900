//! Navigable routes and the post-sign-in landing decision.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    RegisterDonor,
    Dashboard,
    Achievements,
    Admin,
    NotFound,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::RegisterDonor => "/register-donor",
            Route::Dashboard => "/dashboard",
            Route::Achievements => "/achievements",
            Route::Admin => "/admin",
            Route::NotFound => "/404",
        }
    }

    /// Resolve a client path. `/` lands on the login screen; anything
    /// unknown is `NotFound`.
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/login" => Route::Login,
            "/register-donor" => Route::RegisterDonor,
            "/dashboard" => Route::Dashboard,
            "/achievements" => Route::Achievements,
            "/admin" => Route::Admin,
            _ => Route::NotFound,
        }
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Where a freshly signed-in user goes.
pub fn landing_route(admin_sign_in: bool, has_donor_profile: bool) -> Route {
    if admin_sign_in {
        Route::Admin
    } else if has_donor_profile {
        Route::Dashboard
    } else {
        Route::RegisterDonor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_redirects_to_login() {
        assert_eq!(Route::from_path("/"), Route::Login);
        assert_eq!(Route::from_path(""), Route::Login);
    }

    #[test]
    fn known_paths_round_trip() {
        for route in [
            Route::Login,
            Route::RegisterDonor,
            Route::Dashboard,
            Route::Achievements,
            Route::Admin,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
    }

    #[test]
    fn landing_decision() {
        assert_eq!(landing_route(true, false), Route::Admin);
        assert_eq!(landing_route(false, false), Route::RegisterDonor);
        assert_eq!(landing_route(false, true), Route::Dashboard);
    }

    #[test]
    fn serializes_as_path() {
        let json = serde_json::to_string(&Route::RegisterDonor).unwrap();
        assert_eq!(json, "\"/register-donor\"");
    }
}
