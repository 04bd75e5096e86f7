use rand::Rng;

/// A scraping identity presented to an origin.
///
/// Each origin session carries one identity for its lifetime; rotation
/// swaps the whole identity at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserIdentity {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub accept_language: String,
}

/// Common desktop user agents.
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Common viewport sizes.
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

impl BrowserIdentity {
    /// Generate a randomized identity.
    pub fn randomized() -> Self {
        Self::randomized_with(&mut rand::thread_rng())
    }

    /// Generate a randomized identity from a caller-supplied RNG.
    ///
    /// Lets the session manager draw identities from its seeded RNG so
    /// rotation is reproducible in tests.
    pub fn randomized_with(rng: &mut impl Rng) -> Self {
        let ua_idx = rng.gen_range(0..USER_AGENTS.len());
        let vp_idx = rng.gen_range(0..VIEWPORTS.len());
        let (width, height) = VIEWPORTS[vp_idx];

        Self {
            user_agent: USER_AGENTS[ua_idx].to_string(),
            viewport_width: width,
            viewport_height: height,
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_randomized_identity() {
        let identity = BrowserIdentity::randomized();
        assert!(!identity.user_agent.is_empty());
        assert!(identity.viewport_width > 0);
        assert!(identity.viewport_height > 0);
        assert!(!identity.accept_language.is_empty());
    }

    #[test]
    fn test_identity_variation() {
        // Identities should differ at least some of the time
        // (This is probabilistic but very unlikely to fail)
        let identities: Vec<_> = (0..20).map(|_| BrowserIdentity::randomized()).collect();

        let first = &identities[0];
        let all_same = identities
            .iter()
            .all(|i| i.user_agent == first.user_agent && i.viewport_width == first.viewport_width);
        assert!(!all_same, "Expected variation in identities");
    }

    #[test]
    fn test_seeded_identity_reproducible() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        assert_eq!(
            BrowserIdentity::randomized_with(&mut rng_a),
            BrowserIdentity::randomized_with(&mut rng_b)
        );
    }
}
