//! Maps raw transport/server error text to a short user-facing category.
//!
//! Presentation-only: nothing in the queue or retry logic branches on the
//! result of [`classify`]. Matching is case-insensitive substring search,
//! checked in a fixed precedence order.

/// User-facing failure category. `Display` renders the French text shown in
/// the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCategory {
    /// Host unresolvable or network unreachable.
    Connectivity,
    /// Connect/read timeout.
    Timeout,
    /// TLS handshake or certificate problem.
    TlsSecurity,
    /// The server answered with a non-success HTTP status; carries the
    /// status text (e.g. `"500"`).
    ServerStatus(String),
    /// Anything else; carries the trimmed raw message.
    Other(String),
    /// No error text was available at all.
    Unspecified,
}

/// Classify a raw error message.
///
/// Precedence: connectivity, then timeout, then TLS, then server status,
/// then the generic fallback.
pub fn classify(raw: &str) -> FailureCategory {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FailureCategory::Unspecified;
    }

    let lower = trimmed.to_lowercase();

    const CONNECTIVITY: &[&str] = &[
        "unable to resolve host",
        "failed to connect",
        "no address",
        "unknownhost",
        "network is unreachable",
        "network unreachable",
        "dns error",
        "connection refused",
    ];
    if CONNECTIVITY.iter().any(|n| lower.contains(n)) {
        return FailureCategory::Connectivity;
    }

    if lower.contains("timeout") || lower.contains("timed out") {
        return FailureCategory::Timeout;
    }

    if lower.contains("ssl")
        || lower.contains("tls")
        || lower.contains("certificate")
        || lower.contains("handshake")
    {
        return FailureCategory::TlsSecurity;
    }

    if lower.starts_with("server returned code") {
        let code = lower
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_uppercase();
        return FailureCategory::ServerStatus(code);
    }

    FailureCategory::Other(trimmed.to_string())
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::Connectivity => write!(f, "Pas de connexion"),
            FailureCategory::Timeout => write!(f, "Délai d'attente réseau"),
            FailureCategory::TlsSecurity => write!(f, "Erreur de sécurité réseau"),
            FailureCategory::ServerStatus(code) if code.is_empty() => {
                write!(f, "Erreur du serveur")
            }
            FailureCategory::ServerStatus(code) => write!(f, "Erreur du serveur (code {code})"),
            FailureCategory::Other(msg) => write!(f, "Échec: {msg}"),
            FailureCategory::Unspecified => write!(f, "Échec de la synchronisation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_host_is_connectivity() {
        assert_eq!(
            classify("Unable to resolve host deliveries.example.com"),
            FailureCategory::Connectivity
        );
    }

    #[test]
    fn server_code_carries_status() {
        assert_eq!(
            classify("Server returned code 500"),
            FailureCategory::ServerStatus("500".into())
        );
        assert_eq!(
            classify("Server returned code 500").to_string(),
            "Erreur du serveur (code 500)"
        );
    }

    #[test]
    fn timeout_beats_generic() {
        assert_eq!(classify("connect timed out"), FailureCategory::Timeout);
    }

    #[test]
    fn connectivity_beats_timeout() {
        // Both needles present; connectivity is checked first.
        assert_eq!(
            classify("failed to connect: operation timed out"),
            FailureCategory::Connectivity
        );
    }

    #[test]
    fn tls_is_security() {
        assert_eq!(
            classify("SSL handshake aborted"),
            FailureCategory::TlsSecurity
        );
    }

    #[test]
    fn blank_is_unspecified() {
        assert_eq!(classify("   "), FailureCategory::Unspecified);
        assert_eq!(classify("").to_string(), "Échec de la synchronisation");
    }

    #[test]
    fn anything_else_keeps_the_message() {
        assert_eq!(
            classify("boom").to_string(),
            "Échec: boom"
        );
    }
}
