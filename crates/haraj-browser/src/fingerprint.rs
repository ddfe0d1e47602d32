use rand::seq::SliceRandom;

const DESKTOP_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
];

const DESKTOP_VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Desktop identity presented by a launched browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl FingerprintConfig {
    /// Pick a common desktop user agent and screen size.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = DESKTOP_USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(DESKTOP_USER_AGENTS[0]);
        let (viewport_width, viewport_height) = DESKTOP_VIEWPORTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(DESKTOP_VIEWPORTS[0]);

        Self {
            user_agent: user_agent.to_string(),
            viewport_width,
            viewport_height,
        }
    }

    /// Pin the user agent when one is configured.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        if let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) {
            self.user_agent = ua.to_string();
        }
        self
    }

    /// Pin the viewport when one is configured.
    #[must_use]
    pub fn with_viewport(mut self, viewport: Option<(u32, u32)>) -> Self {
        if let Some((width, height)) = viewport.filter(|(w, h)| *w > 0 && *h > 0) {
            self.viewport_width = width;
            self.viewport_height = height;
        }
        self
    }
}
