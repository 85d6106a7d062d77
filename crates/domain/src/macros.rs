//! Declarative macros shared by the domain types
//!
//! - [`impl_domain_status_conversions!`] gives status enums a stable
//!   snake_case string form (Display) and case-insensitive parsing (FromStr).
//! - [`impl_cached_entity!`] wires a record struct with `id` and `cache`
//!   fields into the [`CachedEntity`](crate::entities::CachedEntity) trait.
//!
//! # Example
//!
//! ```rust
//! use lubesync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Upload,
//!     Download,
//! }
//!
//! impl_domain_status_conversions!(Phase {
//!     Upload => "upload",
//!     Download => "download",
//! });
//!
//! assert_eq!(Phase::Upload.to_string(), "upload");
//! assert_eq!("DOWNLOAD".parse::<Phase>().unwrap(), Phase::Download);
//! ```

/// Implements Display and FromStr for status enums.
///
/// Parsing is case-insensitive; the error names the enum and the rejected
/// input.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Stable string form used in storage and events.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

/// Implements [`CachedEntity`](crate::entities::CachedEntity) for a record
/// struct that carries `id: i64` and `cache: CacheMetadata` fields.
#[macro_export]
macro_rules! impl_cached_entity {
    ($($record:ident => $entity_type:ident),+ $(,)?) => {
        $(
            impl $crate::entities::CachedEntity for $record {
                const ENTITY_TYPE: $crate::types::EntityType =
                    $crate::types::EntityType::$entity_type;

                fn id(&self) -> i64 {
                    self.id
                }

                fn set_id(&mut self, id: i64) {
                    self.id = id;
                }

                fn metadata(&self) -> &$crate::types::CacheMetadata {
                    &self.cache
                }

                fn metadata_mut(&mut self) -> &mut $crate::types::CacheMetadata {
                    &mut self.cache
                }
            }
        )+
    };
}
