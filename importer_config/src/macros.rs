/// Declares a group of configuration values inside the invoking module.
///
/// The group is named after the enclosing module; each value can be overridden with the
/// environment variable `PRODUCT_IMPORTER_{GROUP}_{FIELD}` (both upper-cased).
///
/// ```ignore
/// mod session {
///     importer_config::config_group!({
///         /// Delay before a succeeded session returns to idle.
///         ref success_reset_delay: Duration = Duration::from_secs(2);
///     });
/// }
/// // `PRODUCT_IMPORTER_SESSION_SUCCESS_RESET_DELAY=500ms` overrides the default.
/// ```
#[macro_export]
macro_rules! config_group {
    ({
        $(
            $(#[$meta:meta])*
            ref $name:ident : $type:ty = $value:expr;
        )*
    }) => {
        #[allow(unused_imports)]
        use $crate::ParsableConfigValue;

        #[derive(Clone, Debug)]
        #[allow(non_snake_case)]
        pub struct ConfigValueGroup {
            $(
                $(#[$meta])*
                pub $name: $type,
            )*
        }

        impl ConfigValueGroup {
            /// Creates the group holding only the default values.
            pub fn new() -> Self {
                Self {
                    $( $name: $value, )*
                }
            }

            /// The group name, taken from the module the group was declared in.
            pub fn group_name() -> &'static str {
                module_path!().rsplit("::").next().unwrap_or_default()
            }

            /// Replaces each value with its environment override, if one is set and parses.
            pub fn apply_env_overrides(&mut self) {
                let group = Self::group_name().to_ascii_uppercase();
                $(
                    let env_name = format!(
                        "{}_{}_{}",
                        $crate::ENV_PREFIX,
                        group,
                        stringify!($name).to_ascii_uppercase()
                    );
                    let maybe_env_value = std::env::var(&env_name).ok();
                    let default_value = self.$name.clone();
                    self.$name = <$type as $crate::ParsableConfigValue>::parse(&env_name, maybe_env_value, default_value);
                )*
            }
        }

        impl Default for ConfigValueGroup {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
