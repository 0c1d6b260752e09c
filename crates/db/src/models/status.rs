//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Generation job lifecycle status.
    JobStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
        Cancelled = 5,
    }
}

define_status_enum! {
    /// Per-photo unit-of-work status.
    TaskStatus {
        Pending = 1,
        Completed = 2,
        Failed = 3,
    }
}

define_status_enum! {
    /// Payment lifecycle status (mirrors the processor's view).
    PaymentStatus {
        Pending = 1,
        Succeeded = 2,
        Refunded = 3,
        Failed = 4,
    }
}

define_status_enum! {
    /// Avatar (profile) lifecycle status.
    AvatarStatus {
        Draft = 1,
        Ready = 2,
        Generating = 3,
        Completed = 4,
    }
}
