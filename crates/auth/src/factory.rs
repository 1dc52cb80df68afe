//! Claims factory: derives access/refresh claims from a subject and the
//! token specification.

use std::sync::Arc;

use idgate_core::{Clock, IdGenerator, RandomIdGenerator, SystemClock, Timestamp, Ttl};

use crate::claims::{Claims, PrivateClaims};
use crate::token_spec::{TokenConfigError, TokenSpecification};

/// Builds claims for newly issued tokens.
///
/// Pure apart from reading the injected clock and id source: no IO, no
/// suspension. Construction fails if the specification lacks a lifetime, so a
/// misconfigured process cannot issue tokens at all.
#[derive(Clone)]
pub struct ClaimsFactory {
    spec: Arc<TokenSpecification>,
    access_ttl: Ttl,
    refresh_ttl: Ttl,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ClaimsFactory {
    pub fn new(
        spec: Arc<TokenSpecification>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, TokenConfigError> {
        let (access_ttl, refresh_ttl) = spec.lifetimes()?;
        Ok(Self {
            spec,
            access_ttl,
            refresh_ttl,
            clock,
            ids,
        })
    }

    /// Factory on the wall clock with random v4 identifiers.
    pub fn with_system_sources(spec: Arc<TokenSpecification>) -> Result<Self, TokenConfigError> {
        Self::new(spec, Arc::new(SystemClock), Arc::new(RandomIdGenerator))
    }

    pub fn spec(&self) -> &TokenSpecification {
        &self.spec
    }

    pub fn access_claims(&self, subject: &str, not_before: Option<Timestamp>) -> Claims {
        self.issue(subject, self.access_ttl, not_before, PrivateClaims::default())
    }

    pub fn refresh_claims(&self, subject: &str, not_before: Option<Timestamp>) -> Claims {
        self.issue(subject, self.refresh_ttl, not_before, PrivateClaims::default())
    }

    /// Access claims carrying private claims (email, roles, scope).
    pub fn access_claims_with(
        &self,
        subject: &str,
        not_before: Option<Timestamp>,
        private: PrivateClaims,
    ) -> Claims {
        self.issue(subject, self.access_ttl, not_before, private)
    }

    fn issue(
        &self,
        subject: &str,
        ttl: Ttl,
        not_before: Option<Timestamp>,
        private: PrivateClaims,
    ) -> Claims {
        let iat = Timestamp::from(self.clock.now());
        let nbf = not_before.unwrap_or(iat);

        let mut builder = Claims::builder()
            .sub(subject)
            .jti(self.ids.next_id())
            .iat(iat)
            .nbf(nbf)
            .exp(nbf.add(ttl))
            .private(private);

        if let Some(iss) = self.spec.issuer() {
            builder = builder.iss(iss);
        }
        if !self.spec.audience().is_empty() {
            builder = builder.aud(self.spec.audience().iter().cloned());
        }

        builder.build_issued()
    }
}

impl core::fmt::Debug for ClaimsFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClaimsFactory")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    use proptest::prelude::*;

    use idgate_core::FixedClock;

    use super::*;

    /// Deterministic ids, to pin down what the factory does with them.
    #[derive(Default)]
    struct Sequential(AtomicU64);

    impl IdGenerator for Sequential {
        fn next_id(&self) -> String {
            format!("{:032x}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn spec(access: i64, refresh: i64) -> Arc<TokenSpecification> {
        Arc::new(
            TokenSpecification::new("auth")
                .with_audience(["api", "admin"])
                .with_access_ttl(Ttl::from_secs(access).unwrap())
                .with_refresh_ttl(Ttl::from_secs(refresh).unwrap()),
        )
    }

    fn frozen_factory(now: i64, spec: Arc<TokenSpecification>) -> ClaimsFactory {
        ClaimsFactory::new(spec, Arc::new(FixedClock::at_unix(now)), Arc::new(RandomIdGenerator)).unwrap()
    }

    #[test]
    fn missing_lifetime_fails_construction() {
        let spec = Arc::new(TokenSpecification::new("auth").with_access_ttl(Ttl::ZERO));
        let err = ClaimsFactory::with_system_sources(spec).unwrap_err();
        assert_eq!(err, TokenConfigError::MissingTtl("refresh_ttl"));
    }

    #[test]
    fn access_claims_are_fully_populated() {
        let factory = frozen_factory(1_000, spec(900, 86_400));
        let claims = factory.access_claims("42", None);

        assert_eq!(claims.sub(), Some("42"));
        assert_eq!(claims.iss(), Some("auth"));
        assert_eq!(claims.aud().map(<[String]>::len), Some(2));
        assert_eq!(claims.iat(), Some(Timestamp::from_unix(1_000)));
        assert_eq!(claims.nbf(), claims.iat());
        assert_eq!(claims.exp(), Some(Timestamp::from_unix(1_900)));
        assert_eq!(claims.jti().map(str::len), Some(32));
    }

    #[test]
    fn refresh_claims_use_the_refresh_lifetime() {
        let factory = frozen_factory(1_000, spec(900, 86_400));
        let claims = factory.refresh_claims("42", None);
        assert_eq!(claims.exp(), Some(Timestamp::from_unix(87_400)));
    }

    #[test]
    fn empty_issuer_and_audience_are_omitted() {
        let spec = Arc::new(
            TokenSpecification::new("")
                .with_access_ttl(Ttl::from_secs(60).unwrap())
                .with_refresh_ttl(Ttl::from_secs(120).unwrap()),
        );
        let claims = frozen_factory(0, spec).access_claims("42", None);
        let map = claims.to_map().unwrap();

        assert!(!map.contains_key("iss"));
        assert!(!map.contains_key("aud"));
    }

    #[test]
    fn jti_is_unique_within_one_clock_tick() {
        let factory = frozen_factory(1_000, spec(900, 86_400));

        let access = factory.access_claims("42", None);
        let refresh = factory.refresh_claims("42", None);
        assert_eq!(access.iat(), refresh.iat());
        assert_ne!(access.jti(), refresh.jti());

        let many: HashSet<String> = (0..500)
            .map(|_| factory.access_claims("42", None).jti().unwrap_or_default().to_string())
            .collect();
        assert_eq!(many.len(), 500);
    }

    #[test]
    fn jti_comes_from_the_injected_source() {
        let factory = ClaimsFactory::new(
            spec(60, 120),
            Arc::new(FixedClock::at_unix(0)),
            Arc::new(Sequential::default()),
        )
        .unwrap();

        assert_eq!(factory.access_claims("1", None).jti(), Some("0".repeat(32).as_str()));
        assert_eq!(
            factory.refresh_claims("1", None).jti(),
            Some(format!("{:032x}", 1).as_str())
        );
    }

    #[test]
    fn private_claims_are_carried() {
        let factory = frozen_factory(1_000, spec(900, 86_400));
        let claims = factory.access_claims_with(
            "42",
            None,
            PrivateClaims {
                email: Some("a@b.com".into()),
                ..PrivateClaims::default()
            },
        );
        assert_eq!(claims.email(), Some("a@b.com"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: exp is always nbf + ttl, and nbf defaults to iat.
        #[test]
        fn exp_is_nbf_plus_ttl(
            now in 0i64..4_000_000_000,
            access in 0i64..10_000_000,
            refresh in 0i64..100_000_000,
            subject in "[a-z0-9-]{1,36}",
        ) {
            let spec = spec(access, refresh);
            let factory = frozen_factory(now, Arc::clone(&spec));

            let a = factory.access_claims(&subject, None);
            let r = factory.refresh_claims(&subject, None);

            prop_assert_eq!(a.nbf(), a.iat());
            prop_assert_eq!(r.nbf(), r.iat());
            prop_assert_eq!(a.exp().unwrap().as_unix(), a.nbf().unwrap().as_unix() + spec.access_ttl_seconds().unwrap());
            prop_assert_eq!(r.exp().unwrap().as_unix(), r.nbf().unwrap().as_unix() + spec.refresh_ttl_seconds().unwrap());
            prop_assert_ne!(a.jti(), r.jti());
        }

        /// Property: an explicit not-before anchors exp regardless of iat.
        #[test]
        fn explicit_not_before_anchors_exp(
            now in 0i64..4_000_000_000,
            nbf in 0i64..4_000_000_000,
            access in 0i64..10_000_000,
        ) {
            let factory = frozen_factory(now, spec(access, 1));
            let claims = factory.access_claims("42", Some(Timestamp::from_unix(nbf)));

            prop_assert_eq!(claims.iat(), Some(Timestamp::from_unix(now)));
            prop_assert_eq!(claims.nbf(), Some(Timestamp::from_unix(nbf)));
            prop_assert_eq!(claims.exp(), Some(Timestamp::from_unix(nbf + access)));
        }
    }
}
