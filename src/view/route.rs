use std::fmt;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::types::RecordKind;

/// Characters escaped in a DN path segment; `=` and `,` stay readable
const DN_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client-side routes, written as hash fragments (`#!/issuers`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Certificates,
    /// Not implemented yet; mounts a placeholder
    CertificateView(String),
    /// Not implemented yet; mounts a placeholder
    CertificateAdd,
    Issuers,
    IssuerView(String),
    IssuerAdd,
    IssuerRemove(String),
}

impl Route {
    /// Resolve a path, falling back to the issuer list for anything unknown
    pub fn resolve(path: &str) -> Route {
        Self::try_resolve(path).unwrap_or(Route::Issuers)
    }

    /// Resolve a path, accepting `#!/x`, `#/x` and `/x`.
    ///
    /// DN segments are percent-decoded; a segment that does not decode to
    /// UTF-8 leaves the path unmatched.
    pub fn try_resolve(path: &str) -> Option<Route> {
        let path = path.trim();
        let path = path
            .strip_prefix("#!")
            .or_else(|| path.strip_prefix('#'))
            .unwrap_or(path);

        let route = match path {
            "/certificates" => Route::Certificates,
            "/certificates/add" => Route::CertificateAdd,
            "/issuers" => Route::Issuers,
            "/issuers/add" => Route::IssuerAdd,
            _ => {
                if let Some(dn) = non_empty(path.strip_prefix("/certificates/view/")) {
                    Route::CertificateView(dn)
                } else if let Some(dn) = non_empty(path.strip_prefix("/issuers/view/")) {
                    Route::IssuerView(dn)
                } else if let Some(dn) = non_empty(path.strip_prefix("/issuers/remove/")) {
                    Route::IssuerRemove(dn)
                } else {
                    return None;
                }
            }
        };
        Some(route)
    }

    /// Detail route for one record
    pub fn view(kind: RecordKind, dn: impl Into<String>) -> Route {
        match kind {
            RecordKind::Certificate => Route::CertificateView(dn.into()),
            RecordKind::Issuer => Route::IssuerView(dn.into()),
        }
    }

    /// Routes without a view behind them
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Route::CertificateView(_) | Route::CertificateAdd)
    }

    /// Link target as used in rendered pages
    pub fn href(&self) -> String {
        format!("#!{}", self)
    }
}

fn non_empty(rest: Option<&str>) -> Option<String> {
    let rest = rest.filter(|s| !s.is_empty())?;
    let dn = percent_decode_str(rest).decode_utf8().ok()?;
    Some(dn.into_owned()).filter(|dn| !dn.is_empty())
}

struct Segment<'a>(&'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", utf8_percent_encode(self.0, DN_SEGMENT))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Certificates => write!(f, "/certificates"),
            Route::CertificateView(dn) => write!(f, "/certificates/view/{}", Segment(dn)),
            Route::CertificateAdd => write!(f, "/certificates/add"),
            Route::Issuers => write!(f, "/issuers"),
            Route::IssuerView(dn) => write!(f, "/issuers/view/{}", Segment(dn)),
            Route::IssuerAdd => write!(f, "/issuers/add"),
            Route::IssuerRemove(dn) => write!(f, "/issuers/remove/{}", Segment(dn)),
        }
    }
}

impl Default for Route {
    fn default() -> Self {
        Route::Issuers
    }
}
