use std::time::Duration;

crate::config_group!({

    /// How long a succeeded import stays visible before the controller returns to idle.
    ///
    /// The default value is 2 seconds.
    ///
    /// Use the environment variable `PRODUCT_IMPORTER_SESSION_SUCCESS_RESET_DELAY` to set this value.
    ref success_reset_delay : Duration = Duration::from_secs(2);

});
