//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table.

use crate::error::CoreError;

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Declare a lookup-backed enum with `id()`, `name()`, `from_id()` and a
/// `StatusId` conversion.
macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($table:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// All variants in seed order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> $crate::status::StatusId {
                self as $crate::status::StatusId
            }

            /// Seed-data name of this variant.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Resolve a database ID back into the enum.
            pub fn from_id(id: $crate::status::StatusId) -> Result<Self, $crate::error::CoreError> {
                match id {
                    $( $val => Ok($name::$variant), )+
                    other => Err($crate::status::unknown_id($table, other)),
                }
            }
        }

        impl From<$name> for $crate::status::StatusId {
            fn from(value: $name) -> Self {
                value as $crate::status::StatusId
            }
        }
    };
}

pub(crate) use define_status_enum;

#[doc(hidden)]
pub fn unknown_id(table: &'static str, id: StatusId) -> CoreError {
    CoreError::Internal(format!("Unknown id {id} in lookup table {table}"))
}
