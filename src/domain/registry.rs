//! Registrable-domain lookup.
//!
//! Computing the registrable domain of a hostname requires the public suffix
//! list, which this crate does not reimplement. The [`DomainRegistry`] trait is
//! the seam: [`PublicSuffixList`] is the production implementation, and any
//! `Fn(&str) -> String` can stand in for it in tests.

/// Computes the registrable domain of a hostname.
///
/// Implementations must be total: unrecognised input may be returned
/// unchanged, but must never panic.
pub trait DomainRegistry {
    /// Returns the registrable domain of `hostname`, e.g. `example.co.uk` for
    /// `downloads.example.co.uk`.
    fn registrable_domain(&self, hostname: &str) -> String;
}

impl<F> DomainRegistry for F
where
    F: Fn(&str) -> String,
{
    fn registrable_domain(&self, hostname: &str) -> String {
        self(hostname)
    }
}

/// A registry backed by the compiled Mozilla public suffix list.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicSuffixList;

impl DomainRegistry for PublicSuffixList {
    fn registrable_domain(&self, hostname: &str) -> String {
        let hostname = hostname.to_ascii_lowercase();
        psl::domain_str(&hostname).map_or_else(
            || {
                tracing::trace!(%hostname, "no registrable domain, using hostname");
                hostname.clone()
            },
            str::to_string,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_subdomains() {
        let registry = PublicSuffixList;
        assert_eq!(registry.registrable_domain("cdn.example.com"), "example.com");
        assert_eq!(registry.registrable_domain("example.com"), "example.com");
    }

    #[test]
    fn respects_multi_label_suffixes() {
        let registry = PublicSuffixList;
        assert_eq!(
            registry.registrable_domain("sub.example.co.uk"),
            "example.co.uk"
        );
    }

    #[test]
    fn lowercases_input() {
        let registry = PublicSuffixList;
        assert_eq!(registry.registrable_domain("Files.Example.COM"), "example.com");
    }

    #[test]
    fn closures_are_registries() {
        let registry = |hostname: &str| hostname.trim_start_matches("cdn.").to_string();
        assert_eq!(registry.registrable_domain("cdn.example.com"), "example.com");
    }
}
