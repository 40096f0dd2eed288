//! Entity to reference-index resolution.
//!
//! ```text
//! country -> index name              resolved
//! country -> unusable                MissingIndexMapping
//! country -> no_mapping -> exchange  resolved, or skip on sentinel / absent
//! country absent                     MissingIndexMapping (no exchange fallback)
//! ```

use crate::error::ResolutionError;
use crate::map::{Lookup, MarketMap};
use serde::Serialize;
use std::fmt;

/// Which table produced the resolved index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    /// Country of domicile
    Country,
    /// Listing exchange fallback
    Exchange,
}

impl fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Country => write!(f, "country"),
            Self::Exchange => write!(f, "exchange"),
        }
    }
}

/// A resolved reference index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Index series name
    pub index: String,
    /// Table the name came from
    pub via: ResolvedVia,
}

/// Resolves entities against a borrowed [`MarketMap`].
#[derive(Debug, Clone, Copy)]
pub struct MarketResolver<'a> {
    map: &'a MarketMap,
}

impl<'a> MarketResolver<'a> {
    /// Create a resolver over `map`.
    pub const fn new(map: &'a MarketMap) -> Self {
        Self { map }
    }

    /// Resolve an entity's reference index from its country and exchange.
    ///
    /// Blank codes count as absent. The exchange is only consulted when the
    /// country explicitly maps to the `no_mapping` sentinel.
    pub fn resolve(
        &self,
        country: Option<&str>,
        exchange: Option<&str>,
    ) -> Result<Resolution, ResolutionError> {
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ResolutionError::MissingCountry)?;

        match self.map.lookup_country(country) {
            Lookup::Index(index) => Ok(Resolution {
                index: index.to_string(),
                via: ResolvedVia::Country,
            }),
            Lookup::Unusable => Err(ResolutionError::CountryUnusable(country.to_string())),
            Lookup::Absent => Err(ResolutionError::UnknownCountry(country.to_string())),
            Lookup::NoMapping => self.resolve_exchange(country, exchange),
        }
    }

    fn resolve_exchange(
        &self,
        country: &str,
        exchange: Option<&str>,
    ) -> Result<Resolution, ResolutionError> {
        let exchange = exchange
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ResolutionError::MissingExchange {
                country: country.to_string(),
            })?;

        match self.map.lookup_exchange(exchange) {
            Lookup::Index(index) => Ok(Resolution {
                index: index.to_string(),
                via: ResolvedVia::Exchange,
            }),
            Lookup::NoMapping | Lookup::Unusable => {
                Err(ResolutionError::ExchangeUnusable(exchange.to_string()))
            }
            Lookup::Absent => Err(ResolutionError::UnknownExchange(exchange.to_string())),
        }
    }
}

/// Resolve with a one-off [`MarketResolver`].
pub fn resolve(
    map: &MarketMap,
    country: Option<&str>,
    exchange: Option<&str>,
) -> Result<Resolution, ResolutionError> {
    MarketResolver::new(map).resolve(country, exchange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Sentinels;
    use rstest::rstest;

    fn map() -> MarketMap {
        let pairs = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        };
        MarketMap::new(
            Sentinels::default(),
            pairs(&[
                ("US", "S&P 500"),
                ("DE", "NO_MAPPING"),
                ("CH", "NO_MAPPING"),
                ("VE", "NO_INDEX"),
            ]),
            pairs(&[("FRA", "DAX 30"), ("SWX", "NO_INDEX"), ("OTC", "NO_MAPPING")]),
        )
        .unwrap()
    }

    #[test]
    fn test_country_hit() {
        let map = map();
        let resolved = resolve(&map, Some("US"), Some("FRA")).unwrap();
        assert_eq!(resolved.index, "S&P 500");
        assert_eq!(resolved.via, ResolvedVia::Country);
    }

    #[test]
    fn test_exchange_fallback() {
        let map = map();
        let resolved = resolve(&map, Some(" DE "), Some("FRA")).unwrap();
        assert_eq!(resolved.index, "DAX 30");
        assert_eq!(resolved.via, ResolvedVia::Exchange);
    }

    #[rstest]
    #[case(Some("VE"), Some("FRA"), ResolutionError::CountryUnusable("VE".into()))]
    #[case(Some("FR"), Some("FRA"), ResolutionError::UnknownCountry("FR".into()))]
    #[case(None, Some("FRA"), ResolutionError::MissingCountry)]
    #[case(Some("  "), Some("FRA"), ResolutionError::MissingCountry)]
    #[case(Some("DE"), None, ResolutionError::MissingExchange { country: "DE".into() })]
    #[case(Some("CH"), Some("SWX"), ResolutionError::ExchangeUnusable("SWX".into()))]
    #[case(Some("CH"), Some("OTC"), ResolutionError::ExchangeUnusable("OTC".into()))]
    #[case(Some("CH"), Some("LSE"), ResolutionError::UnknownExchange("LSE".into()))]
    fn test_unresolved(
        #[case] country: Option<&str>,
        #[case] exchange: Option<&str>,
        #[case] expected: ResolutionError,
    ) {
        assert_eq!(resolve(&map(), country, exchange), Err(expected));
    }

    #[test]
    fn test_deterministic() {
        let map = map();
        let resolver = MarketResolver::new(&map);
        let first = resolver.resolve(Some("DE"), Some("FRA"));
        for _ in 0..10 {
            assert_eq!(resolver.resolve(Some("DE"), Some("FRA")), first);
        }
    }
}
