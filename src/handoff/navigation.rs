use crate::config::ConfigError;
use url::Url;

/// Where a page sends the user once it is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Passkey management, reached after a successful handoff.
    PasskeySetup,
    /// Login, the fallback for every failed handoff.
    Login,
    /// A location outside the web app, such as the desktop app's URL scheme.
    External(Url),
}

impl Destination {
    /// Resolves the destination against the configured routes.
    #[must_use]
    pub fn location(&self, routes: &Routes) -> String {
        match self {
            Self::PasskeySetup => routes.success_path.clone(),
            Self::Login => routes.failure_path.clone(),
            Self::External(url) => url.to_string(),
        }
    }
}

/// Navigation targets. Paths are configuration, not part of the flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routes {
    success_path: String,
    failure_path: String,
    desktop_url: Url,
}

impl Routes {
    /// # Errors
    /// Returns an error if either path is not an absolute in-app path or the
    /// desktop URL does not parse.
    pub fn new(success_path: &str, failure_path: &str, desktop_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            success_path: in_app_path("success path", success_path)?,
            failure_path: in_app_path("failure path", failure_path)?,
            desktop_url: Url::parse(desktop_url.trim()).map_err(|source| {
                ConfigError::InvalidUrl {
                    value: desktop_url.to_string(),
                    source,
                }
            })?,
        })
    }

    #[must_use]
    pub fn success_path(&self) -> &str {
        &self.success_path
    }

    #[must_use]
    pub fn failure_path(&self) -> &str {
        &self.failure_path
    }

    #[must_use]
    pub fn desktop_url(&self) -> &Url {
        &self.desktop_url
    }
}

// "//host" and "/\\host" are read by browsers as scheme-relative URLs to another site.
fn in_app_path(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    let leading_slash = chars.next() == Some('/');
    let scheme_relative = matches!(chars.next(), Some('/' | '\\'));
    if leading_slash && !scheme_relative {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidPath {
            name,
            value: value.to_string(),
        })
    }
}

/// Capability to move the user to another screen.
pub trait Navigator {
    fn navigate(&mut self, destination: &Destination);
}

/// Navigator that records the requested destination so the caller can turn
/// it into an HTTP redirect or print it.
#[derive(Debug, Default)]
pub struct NavigationRecorder {
    destination: Option<Destination>,
    calls: usize,
}

impl NavigationRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Number of navigations requested.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }

    #[must_use]
    pub fn into_destination(self) -> Option<Destination> {
        self.destination
    }
}

impl Navigator for NavigationRecorder {
    fn navigate(&mut self, destination: &Destination) {
        self.calls += 1;
        self.destination = Some(destination.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn location_uses_configured_paths() -> Result<()> {
        let routes = Routes::new("/passkeys", " /login ", "ente://app/gallery")?;
        assert_eq!(Destination::PasskeySetup.location(&routes), "/passkeys");
        assert_eq!(Destination::Login.location(&routes), "/login");

        let external = Url::parse("ente://app/gallery?token=abc")?;
        assert_eq!(
            Destination::External(external).location(&routes),
            "ente://app/gallery?token=abc"
        );
        Ok(())
    }

    #[test]
    fn rejects_paths_that_leave_the_app() {
        for path in [
            "passkeys",
            "https://evil.example/",
            "//evil.example",
            "/\\evil.example",
            "",
        ] {
            let result = Routes::new(path, "/login", "ente://app/gallery");
            assert!(
                matches!(result, Err(ConfigError::InvalidPath { name: "success path", .. })),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_invalid_desktop_url() {
        let result = Routes::new("/passkeys", "/login", "not a url");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn recorder_keeps_last_destination() {
        let mut recorder = NavigationRecorder::new();
        assert!(recorder.destination().is_none());

        recorder.navigate(&Destination::Login);
        assert_eq!(recorder.destination(), Some(&Destination::Login));
        assert_eq!(recorder.calls(), 1);
        assert_eq!(recorder.into_destination(), Some(Destination::Login));
    }
}
