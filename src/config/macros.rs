/// Configuration macros for single-declaration config structs
///
/// `config_struct!` defines a struct together with its defaults and
/// generates:
/// - The struct with public fields
/// - A `Default` implementation using the declared values
/// - Serde support with `#[serde(default)]`, so partial TOML files work
///
/// # Example
/// ```
/// livesync::config_struct! {
///     pub struct ExampleConfig {
///         port: u16 = 3000,
///         enabled: bool = true,
///     }
/// }
/// assert_eq!(ExampleConfig::default().port, 3000);
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
