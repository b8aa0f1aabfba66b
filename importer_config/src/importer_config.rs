use crate::groups;

/// All configuration for the importer, grouped by concern.
///
/// [`ImporterConfig::new`] starts from the defaults and applies every
/// `PRODUCT_IMPORTER_{GROUP}_{FIELD}` environment override; [`Default`] gives the
/// plain defaults, which is what tests usually want.
#[derive(Clone, Debug, Default)]
pub struct ImporterConfig {
    pub client: groups::client::ConfigValueGroup,
    pub upload: groups::upload::ConfigValueGroup,
    pub session: groups::session::ConfigValueGroup,
    pub log: groups::log::ConfigValueGroup,
}

impl ImporterConfig {
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.client.apply_env_overrides();
        self.upload.apply_env_overrides();
        self.session.apply_env_overrides();
        self.log.apply_env_overrides();
    }

    /// Points the client at a different server, e.g. a mock server in tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.client.endpoint = endpoint.into();
        self
    }
}
